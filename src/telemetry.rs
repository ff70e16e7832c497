//! Logging setup (tracing/tracing-subscriber).
//!
//! CPCOACH_LOG controls the filter, e.g. "debug" or
//! "cp_coach=debug,reqwest=info". Logs go to stderr so command output on
//! stdout stays clean; the default only shows warnings.

use tracing_subscriber::EnvFilter;

pub fn init_tracing(verbose: bool) {
    let default = if verbose { "cp_coach=debug,cpcoach=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("CPCOACH_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
