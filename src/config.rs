//! Runtime configuration.
//!
//! Resolution order: built-in defaults, then `config.toml` in the config
//! directory, then environment variables (a `.env` file is honoured).
//!
//!   CPCOACH_HOME      : config directory (default `<config_dir>/cpcoach`)
//!   CPCOACH_DATA_DIR  : cache directory (default `<data_local_dir>/cpcoach`)
//!   GEMINI_API_KEY    : model credential
//!   GEMINI_MODEL      : model name (default `gemini-2.5-flash`)

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::{CoachError, Result},
    store,
};

pub const CONFIG_FILE: &str = "config.toml";
const PROBLEM_CACHE_FILE: &str = "cf_cache.json";
const ANALYSIS_CACHE_DIR: &str = "cache";

#[derive(Debug, Clone, Builder)]
#[builder(default, setter(into))]
pub struct CoachConfig {
    /// Holds the problem cache document and the per-problem analysis cache.
    pub data_dir: PathBuf,
    /// Holds `config.toml`.
    pub config_dir: PathBuf,
    #[builder(setter(into, strip_option))]
    pub api_key: Option<String>,
    pub model: String,
    pub model_base_url: String,
    pub source_base_url: String,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub polite_delay: Duration,
    pub request_timeout: Duration,
    /// Whether a missing difficulty rating aborts a problem fetch.
    pub require_rating: bool,
    /// Target language of generated solutions.
    pub language: String,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            config_dir: default_config_dir(),
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            model_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            source_base_url: "https://codeforces.com".to_string(),
            max_retries: 3,
            retry_backoff: Duration::from_secs(5),
            polite_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(20),
            require_rating: true,
            language: "C++17".to_string(),
        }
    }
}

/// The subset of [`CoachConfig`] persisted in `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_rating: Option<bool>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s)
                .map_err(|e| CoachError::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(CoachError::io(path, e)),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| CoachError::Config(e.to_string()))?;
        store::write_atomic(path, content.as_bytes())
    }
}

impl CoachConfig {
    pub fn load() -> Result<Self> {
        report_env_file(dotenv::dotenv());

        let config_dir = dotenv::var("CPCOACH_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_dir());
        let file = FileConfig::read(&config_dir.join(CONFIG_FILE))?;

        let mut config = Self {
            config_dir,
            ..Default::default()
        };
        config.merge_file(file);
        config.merge_env();
        debug!(
            data_dir = ?config.data_dir,
            config_dir = ?config.config_dir,
            model = %config.model,
            "configuration loaded"
        );
        Ok(config)
    }

    fn merge_file(&mut self, file: FileConfig) {
        if let Some(key) = file.api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(language) = file.language {
            self.language = language;
        }
        if let Some(dir) = file.data_dir {
            self.data_dir = dir;
        }
        if let Some(require) = file.require_rating {
            self.require_rating = require;
        }
    }

    fn merge_env(&mut self) {
        if let Ok(key) = dotenv::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(model) = dotenv::var("GEMINI_MODEL") {
            self.model = model;
        }
        if let Ok(dir) = dotenv::var("CPCOACH_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn problem_cache_path(&self) -> PathBuf {
        self.data_dir.join(PROBLEM_CACHE_FILE)
    }

    pub fn analysis_dir(&self) -> PathBuf {
        self.data_dir.join(ANALYSIS_CACHE_DIR)
    }

    /// Persist the model credential into `config.toml`, keeping other settings.
    pub fn save_credential(&mut self, api_key: &str) -> Result<()> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(CoachError::Config("API key must not be empty".to_string()));
        }
        let path = self.config_file();
        let mut file = FileConfig::read(&path)?;
        file.api_key = Some(api_key.to_string());
        file.write(&path)?;
        self.api_key = Some(api_key.to_string());
        info!(path = %path.display(), "credential saved");
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum EnvFile {
    Loaded,
    Absent,
    Malformed,
}

/// A missing `.env` is normal; a broken one is logged and skipped.
fn report_env_file(result: std::result::Result<PathBuf, dotenv::Error>) -> EnvFile {
    match result {
        Ok(path) => {
            debug!(path = %path.display(), "loaded .env");
            EnvFile::Loaded
        }
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => EnvFile::Absent,
        Err(e) => {
            warn!(error = %e, "ignoring unreadable .env");
            EnvFile::Malformed
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("cpcoach"))
        .unwrap_or_else(|| PathBuf::from(".cpcoach"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cpcoach"))
        .unwrap_or_else(|| PathBuf::from("data"))
}
