//! Analysis Cache Manager.
//!
//! A problem is "analyzed" exactly when `<data_dir>/cache/<key>.json` exists;
//! no other state is kept between invocations.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::{
    config::CoachConfig,
    error::{CoachError, Result},
    model::{GeminiClient, Model},
    normalize::{extract_json, strip_code_fences},
    problem::{BrowserTransport, HttpFetch, ProblemClient, ProblemKey, ProblemRecord},
    record::AnalysisRecord,
    report::{build_report_sections, ReportSections},
    store,
};

const ANALYSIS_PROMPT: &str = include_str!("../prompts/analyze.txt");
const CODE_PROMPT: &str = include_str!("../prompts/code.txt");

#[derive(Debug, Clone)]
struct Prompts {
    analysis: String,
    code: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            analysis: ANALYSIS_PROMPT.to_string(),
            code: CODE_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    /// An analysis was already cached; nothing was fetched or generated.
    Cached,
    Analyzed,
}

/// One JSON document per analyzed problem.
#[derive(Debug, Clone)]
pub struct AnalysisStore {
    dir: PathBuf,
}

impl AnalysisStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: &ProblemKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.slug()))
    }

    pub fn contains(&self, key: &ProblemKey) -> bool {
        self.path(key).is_file()
    }

    pub fn load(&self, key: &ProblemKey) -> Result<AnalysisRecord> {
        store::read_json(&self.path(key))?.ok_or_else(|| CoachError::CacheMiss {
            key: key.to_string(),
        })
    }

    pub fn save(&self, key: &ProblemKey, record: &AnalysisRecord) -> Result<()> {
        store::write_json_atomic(&self.path(key), record)
    }

    /// Number of cached analyses.
    pub fn len(&self) -> Result<usize> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CoachError::io(&self.dir, e)),
        };
        Ok(entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .count())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

pub struct Coach<T, M> {
    problems: ProblemClient<T>,
    model: M,
    store: AnalysisStore,
    prompts: Prompts,
    language: String,
}

impl Coach<BrowserTransport, GeminiClient> {
    pub fn from_config(config: &CoachConfig) -> Result<Self> {
        let problems = ProblemClient::from_config(config)?;
        let model = GeminiClient::new(config)?;
        Ok(Self::new(problems, model, config))
    }
}

impl<T: HttpFetch, M: Model> Coach<T, M> {
    pub fn new(problems: ProblemClient<T>, model: M, config: &CoachConfig) -> Self {
        Self {
            problems,
            model,
            store: AnalysisStore::new(config.analysis_dir()),
            prompts: Prompts::default(),
            language: config.language.clone(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn store(&self) -> &AnalysisStore {
        &self.store
    }

    pub fn problems(&self) -> &ProblemClient<T> {
        &self.problems
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn is_analyzed(&self, problem_key: &str) -> bool {
        self.store.contains(&ProblemKey::parse(problem_key))
    }

    /// Analyze a problem unless an analysis is already cached.
    pub async fn analyze(&self, problem_key: &str) -> Result<AnalyzeOutcome> {
        let key = ProblemKey::parse(problem_key);
        if self.store.contains(&key) {
            info!(%key, "analysis already cached");
            return Ok(AnalyzeOutcome::Cached);
        }
        self.generate(&key).await?;
        Ok(AnalyzeOutcome::Analyzed)
    }

    /// Analyze a problem, replacing any cached analysis wholesale.
    pub async fn reanalyze(&self, problem_key: &str) -> Result<AnalysisRecord> {
        self.generate(&ProblemKey::parse(problem_key)).await
    }

    #[instrument(level = "info", skip_all, fields(key = %key))]
    async fn generate(&self, key: &ProblemKey) -> Result<AnalysisRecord> {
        let problem = self.problem(key).await?;
        let problem_text = format!("Problem: {}", problem.prompt_text(key).trim());

        let reply = self
            .model
            .generate(&compose(&self.prompts.analysis, &problem_text))
            .await?;
        let analysis = extract_json(&reply)?;

        let code_request = format!(
            "{}\n\nWrite a complete {} solution for the following problem. \
             Output ONLY the code. No explanations.\n\n{}",
            self.prompts.code, self.language, problem_text
        );
        let code = strip_code_fences(&self.model.generate(&code_request).await?);

        let record = AnalysisRecord { analysis, code };
        self.store.save(key, &record)?;
        info!(path = %self.store.path(key).display(), "analysis cached");
        Ok(record)
    }

    /// The hint text for `level`, or a message naming the level when the
    /// analysis has no such hint.
    pub fn get_hint(&self, level: u8, problem_key: &str) -> Result<String> {
        let record = self.store.load(&ProblemKey::parse(problem_key))?;
        Ok(record
            .view()
            .hint(level)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Error: No Hint Level Beyond {level}")))
    }

    /// Write the cached solution code verbatim to `destination`.
    pub fn write_solution(&self, destination: &Path, problem_key: &str) -> Result<()> {
        let record = self.store.load(&ProblemKey::parse(problem_key))?;
        std::fs::write(destination, record.code.as_bytes())
            .map_err(|e| CoachError::io(destination, e))?;
        info!(path = %destination.display(), bytes = record.code.len(), "solution written");
        Ok(())
    }

    /// Report sections for an analyzed problem.
    pub async fn report_sections(&self, problem_key: &str) -> Result<ReportSections> {
        let key = ProblemKey::parse(problem_key);
        let record = self.store.load(&key)?;
        let problem = self.problem(&key).await?;
        Ok(build_report_sections(&record, &problem))
    }

    async fn problem(&self, key: &ProblemKey) -> Result<ProblemRecord> {
        self.problems
            .fetch(key.as_str())
            .await?
            .ok_or_else(|| CoachError::NotFound {
                key: key.to_string(),
            })
    }
}

fn compose(system: &str, user: &str) -> String {
    format!("{system}\n\n{user}")
}
