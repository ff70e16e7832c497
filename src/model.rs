//! Generative-model collaborator.
//!
//! The coach only needs "prompt in, free text out"; any structure in the reply
//! is recovered later by [`crate::normalize`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    config::CoachConfig,
    error::{CoachError, Result},
};

/// Long generations routinely take more than a minute.
const MODEL_TIMEOUT: Duration = Duration::from_secs(180);

#[allow(async_fn_in_trait)]
pub trait Model {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Gemini `generateContent` over REST.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<PartReq<'a>>,
}

#[derive(Debug, Serialize)]
struct PartReq<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResp>,
}

#[derive(Debug, Deserialize)]
struct PartResp {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiClient {
    pub fn new(config: &CoachConfig) -> Result<Self> {
        let api_key = config.api_key.clone().filter(|k| !k.trim().is_empty());

        let client = reqwest::Client::builder()
            .timeout(MODEL_TIMEOUT)
            .build()
            .map_err(|e| CoachError::Model(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.model_base_url.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Commands that only read the cache work without a credential, so its
    /// absence is reported on the first request instead.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl Model for GeminiClient {
    #[instrument(level = "debug", skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CoachError::MissingCredential)?;
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![PartReq { text: prompt }],
            }],
        };

        let res = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoachError::Model(e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| CoachError::Model(e.to_string()))?;
        if !status.is_success() {
            let msg = extract_error_message(&text).unwrap_or(text);
            return Err(CoachError::Model(format!("HTTP {status}: {msg}")));
        }

        let reply = response_text(&text)?;
        debug!(reply_len = reply.len(), "model replied");
        Ok(reply)
    }
}

fn response_text(body: &str) -> Result<String> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| CoachError::Model(format!("bad response: {e}")))?;
    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    Ok(text)
}

fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|e| e.error.message)
}
