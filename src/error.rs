use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = CoachError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CoachError {
    #[error("problem {key} could not be retrieved from the problem source")]
    NotFound { key: String },

    #[error("could not extract JSON from model response: {reason}")]
    ParseFailure { reason: String, text: String },

    #[error("problem {key} has not been analyzed yet, run `cpcoach analyze {key}` first")]
    CacheMiss { key: String },

    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model request failed: {0}")]
    Model(String),

    #[error("no API key configured, run `cpcoach setup --api-key <KEY>` or set GEMINI_API_KEY")]
    MissingCredential,

    #[error("failed to render report: {0}")]
    Render(#[from] askama::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Transport-level failure talking to the problem source. Always retried by
/// the caller, never surfaced to the user.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

impl CoachError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// The raw model output attached to a parse failure, if any.
    pub fn offending_text(&self) -> Option<&str> {
        match self {
            Self::ParseFailure { text, .. } => Some(text),
            _ => None,
        }
    }
}
