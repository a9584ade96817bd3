//! Smellrank: test smell detection and prioritization CLI

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use smellrank::config::load_config;
use smellrank::reporter::{ConsoleReporter, JsonReporter};
use std::path::PathBuf;
use std::process::ExitCode;

/// Smellrank: test smell detection and history-based prioritization for
/// Python test suites
#[derive(Parser, Debug)]
#[command(name = "smellrank")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Project root to analyze (must contain the test files; git history is
    /// mined from the same root when present)
    path: PathBuf,

    /// Output format as JSON
    #[arg(long, short)]
    json: bool,

    /// Quiet mode (per-file smell counts only)
    #[arg(long, short)]
    quiet: bool,

    /// Verbose output
    #[arg(long, short)]
    verbose: bool,

    /// Path to config file (default: search .smellrankrc.json in the project
    /// root and parents)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip history mining and prioritization
    #[arg(long)]
    no_history: bool,

    /// Weight for the change-proneness half of the prioritization score.
    /// Accepted for compatibility; the score applies an equal-weight mean.
    #[arg(long, value_name = "W")]
    cp_weight: Option<f64>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    if !args.path.exists() {
        anyhow::bail!("Path does not exist: {}", args.path.display());
    }

    let mut config = load_config(&args.path, args.config.as_deref())?;
    if args.no_history {
        config.history.enabled = false;
    }
    if let Some(weight) = args.cp_weight {
        config.history.cp_weight = weight;
    }

    let report = smellrank::analyze_project(&args.path, &config)?;

    if args.json {
        let reporter = if args.quiet {
            JsonReporter::new()
        } else {
            JsonReporter::new().pretty()
        };
        println!("{}", reporter.report(&report));
    } else {
        let mut reporter = ConsoleReporter::new();
        if args.verbose {
            reporter = reporter.verbose();
        }
        if args.quiet {
            reporter.report_quiet(&report);
        } else {
            reporter.report(&report);
        }
    }

    Ok(ExitCode::SUCCESS)
}
