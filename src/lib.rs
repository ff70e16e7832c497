pub mod analysis;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod problem;
pub mod record;
pub mod report;
pub mod store;
pub mod telemetry;

pub use analysis::{AnalysisStore, AnalyzeOutcome, Coach};
pub use config::{CoachConfig, CoachConfigBuilder};
pub use error::{CoachError, FetchError, Result};
pub use model::{GeminiClient, Model};
pub use normalize::{extract_json, strip_code_fences};
pub use problem::{BrowserTransport, HttpFetch, HttpResponse, ProblemClient, ProblemKey, ProblemRecord};
pub use record::{Analysis, AnalysisRecord, MAX_HINT_LEVEL};
pub use report::{build_report_sections, ReportSections, Theme};
