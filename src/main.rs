use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cp_coach::{
    report, telemetry, BrowserTransport, Coach, CoachConfig, CoachError,
    HttpFetch, Theme, MAX_HINT_LEVEL,
};
use owo_colors::OwoColorize;
use tracing::debug;

const BANNER: &str = r"
   ██████╗██████╗  ██████╗ ██████╗  █████╗  ██████╗██╗  ██╗
  ██╔════╝██╔══██╗██╔════╝██╔═══██╗██╔══██╗██╔════╝██║  ██║
  ██║     ██████╔╝██║     ██║   ██║███████║██║     ███████║
  ██║     ██╔═══╝ ██║     ██║   ██║██╔══██║██║     ██╔══██║
  ╚██████╗██║     ╚██████╗╚██████╔╝██║  ██║╚██████╗██║  ██║
   ╚═════╝╚═╝      ╚═════╝ ╚═════╝ ╚═╝  ╚═╝ ╚═════╝╚═╝  ╚═╝

       ▀▀▀▀▀  COMPETITIVE PROGRAMMING COACH AGENT  ▀▀▀▀▀
";

/// Competitive Programming Coach Agent
#[derive(Debug, Parser)]
#[command(name = "cpcoach", version)]
struct Cli {
    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze a problem, e.g. 116A or 1850G
    Analyze {
        problem: String,
        /// Language of the generated solution
        #[arg(long)]
        lang: Option<String>,
        /// Regenerate even if an analysis is cached
        #[arg(short, long)]
        force: bool,
    },
    /// Show a hint for an analyzed problem
    Hint {
        problem: String,
        /// 1 is a gentle nudge, 5 gives the whole idea away
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=MAX_HINT_LEVEL as i64))]
        level: u8,
    },
    /// Write the generated solution to a file
    Solution {
        problem: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Render the analysis report as a standalone HTML page (not PDF)
    Report {
        problem: String,
        /// dark, light or sepia
        #[arg(short, long, default_value_t = Theme::Dark)]
        theme: Theme,
        /// Defaults to CPCoach_analysis_<PROBLEM>.html in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Open the report once written
        #[arg(long)]
        open: bool,
    },
    /// Save the Gemini API key
    Setup {
        #[arg(long)]
        api_key: String,
    },
    /// Check the local environment
    Doctor,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        print_banner();
        return Ok(());
    };
    let mut config = CoachConfig::load().context("failed to load configuration")?;

    let result = run(command, &mut config).await;
    if let Err(e) = &result {
        if let Some(text) = e.downcast_ref::<CoachError>().and_then(CoachError::offending_text) {
            debug!(response = %text, "unparseable model response");
            if !cli.verbose {
                eprintln!("{}", "re-run with --verbose to see the raw model response".dimmed());
            }
        }
    }
    result
}

async fn run(command: Command, config: &mut CoachConfig) -> Result<()> {
    match command {
        Command::Analyze {
            problem,
            lang,
            force,
        } => {
            let mut coach = Coach::from_config(config)?;
            if let Some(lang) = lang {
                coach = coach.with_language(lang);
            }
            if force {
                println!("{} Regenerating analysis for {problem}...", "[ANALYZE]".blue());
                coach.reanalyze(&problem).await?;
            } else if coach.is_analyzed(&problem) {
                println!("{} {problem} is already analyzed.", "[ANALYZE]".blue());
            } else {
                println!("{} Processing {problem}, this can take a minute...", "[ANALYZE]".blue());
                let outcome = coach.analyze(&problem).await?;
                debug!(?outcome, "analyze finished");
            }
            println!(
                "{} Try `cpcoach hint {problem} --level 1` or `cpcoach report {problem}`.",
                "[DONE]".green()
            );
        }
        Command::Hint { problem, level } => {
            let coach = Coach::from_config(config)?;
            let hint = coach.get_hint(level, &problem)?;
            println!("{} Level {level}", "[HINT]".yellow());
            println!("{hint}");
        }
        Command::Solution { problem, output } => {
            let coach = Coach::from_config(config)?;
            coach.write_solution(&output, &problem)?;
            println!("{} Solution written to {}", "[SOLUTION]".green(), output.display());
        }
        Command::Report {
            problem,
            theme,
            output,
            open,
        } => {
            let coach = Coach::from_config(config)?;
            let sections = coach.report_sections(&problem).await?;
            let path = match output {
                Some(path) => path,
                None => std::env::current_dir()
                    .context("cannot determine the current directory")?
                    .join(report::default_report_name(&sections)),
            };
            report::write_report(&sections, theme, &path)?;
            println!("{} Report written to {}", "[REPORT]".green(), path.display());
            if open {
                open_file(&path)?;
            }
        }
        Command::Setup { api_key } => {
            config.save_credential(&api_key)?;
            println!(
                "{} API key saved to {}",
                "[SETUP]".green(),
                config.config_file().display()
            );
        }
        Command::Doctor => doctor(config).await?,
    }
    Ok(())
}

fn print_banner() {
    println!("{}", BANNER.green());
    println!("  analyze   - Analyze a problem and cache the result");
    println!("  hint      - Get a hint for an analyzed problem");
    println!("  solution  - Write the generated solution to a file");
    println!("  report    - Render the analysis report as an HTML page");
    println!("  setup     - Save the Gemini API key");
    println!("  doctor    - Check the local environment");
}

fn open_file(path: &Path) -> Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else if cfg!(target_os = "macos") {
        std::process::Command::new("open")
    } else {
        std::process::Command::new("xdg-open")
    };
    command
        .arg(path)
        .spawn()
        .with_context(|| format!("failed to open {}", path.display()))?;
    Ok(())
}

async fn doctor(config: &CoachConfig) -> Result<()> {
    let mut healthy = true;
    let mut check = |ok: bool, what: &str, detail: String| {
        healthy &= ok;
        let mark = if ok { "✓".green().to_string() } else { "✗".red().to_string() };
        println!("  {mark} {what}: {detail}");
    };

    println!("{}", "cpcoach doctor".bold());

    check(
        config.api_key.is_some(),
        "API key",
        if config.api_key.is_some() {
            "configured".to_string()
        } else {
            "missing, run `cpcoach setup --api-key <KEY>`".to_string()
        },
    );

    let writable = std::fs::create_dir_all(config.analysis_dir())
        .and_then(|_| probe_writable(&config.data_dir));
    check(
        writable.is_ok(),
        "data directory",
        match &writable {
            Ok(()) => config.data_dir.display().to_string(),
            Err(e) => format!("{}: {e}", config.data_dir.display()),
        },
    );

    let problems: cp_coach::Result<Option<std::collections::BTreeMap<String, serde_json::Value>>> =
        cp_coach::store::read_json(&config.problem_cache_path());
    check(
        problems.is_ok(),
        "problem cache",
        match &problems {
            Ok(Some(cache)) => format!("{} problems", cache.len()),
            Ok(None) => "empty".to_string(),
            Err(e) => e.to_string(),
        },
    );

    let analyses = cp_coach::AnalysisStore::new(config.analysis_dir()).len();
    check(
        analyses.is_ok(),
        "analysis cache",
        match &analyses {
            Ok(n) => format!("{n} analyses"),
            Err(e) => e.to_string(),
        },
    );

    let reachable = match BrowserTransport::new(config.request_timeout) {
        Ok(transport) => transport
            .get(&config.source_base_url)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    check(
        matches!(&reachable, Ok(res) if res.status < 400),
        "problem source",
        match &reachable {
            Ok(res) => format!("{} answered HTTP {}", config.source_base_url, res.status),
            Err(e) => format!("{} unreachable: {e}", config.source_base_url),
        },
    );

    if healthy {
        println!("{}", "All checks passed.".green());
    } else {
        println!("{}", "Some checks failed.".yellow());
    }
    Ok(())
}

fn probe_writable(dir: &Path) -> std::io::Result<()> {
    let probe = dir.join(".cpcoach-write-probe");
    std::fs::write(&probe, b"ok")?;
    std::fs::remove_file(probe)
}
