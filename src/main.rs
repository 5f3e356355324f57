//! Scrape-Guardrails main entry point
//!
//! This is the command-line interface for running scrape pipelines and
//! inspecting their artifacts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scrape_guardrails::config::{load_config_with_hash, Config};
use scrape_guardrails::output::{load_triage, print_triage};
use scrape_guardrails::pipeline::list_snapshots;
use scrape_guardrails::url::load_url_list;
use scrape_guardrails::{GuardError, Orchestrator};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Snapshot names printed by `diffs`
const DIFFS_PREVIEW: usize = 25;

/// Exit status of a successful command
const EXIT_OK: u8 = 0;

/// Exit status of `triage` when there is no dead-letter file
const EXIT_NO_DEAD_LETTER: u8 = 2;

/// Scrape-Guardrails: fault-tolerant batch scraping
///
/// Fetches every URL of a list through a rate limiter, circuit breaker and
/// retry executor, extracts one field per document, and writes successes and
/// failures to separate JSONL sinks plus a run health report.
#[derive(Parser, Debug)]
#[command(name = "scrape-guardrails")]
#[command(version = "1.0.0")]
#[command(about = "Fault-tolerant batch scraping", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a pipeline over a URL list
    Run {
        /// Pipeline name (built-in: nba)
        #[arg(long)]
        pipeline: String,

        /// File with one URL per line
        #[arg(long, value_name = "PATH")]
        urls_file: PathBuf,

        /// Success sink (JSONL)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// Dead-letter sink (JSONL)
        #[arg(long, value_name = "PATH")]
        dead_letter: Option<PathBuf>,

        /// Health report (JSON)
        #[arg(long, value_name = "PATH")]
        health: Option<PathBuf>,

        /// Snapshot cache directory
        #[arg(long, value_name = "DIR")]
        cache: Option<PathBuf>,

        /// Path to TOML configuration file
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },

    /// Summarize the dead-letter sink by error message
    Triage {
        #[arg(long, value_name = "PATH", default_value = "out/dead_letter.jsonl")]
        dead_letter: PathBuf,
    },

    /// List cached snapshots
    Diffs {
        #[arg(long, value_name = "DIR", default_value = ".cache")]
        cache: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.log_format);

    let result = match cli.command {
        Command::Run {
            pipeline,
            urls_file,
            out,
            dead_letter,
            health,
            cache,
            config,
        } => {
            let overrides = OutputOverrides {
                out,
                dead_letter,
                health,
                cache,
            };
            handle_run(&pipeline, &urls_file, overrides, config.as_deref()).await
        }
        Command::Triage { dead_letter } => handle_triage(&dead_letter),
        Command::Diffs { cache } => handle_diffs(&cache),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so `triage` and `diffs` output stays clean on stdout.
fn setup_logging(verbose: u8, quiet: bool, format: LogFormat) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scrape_guardrails=info,warn"),
            1 => EnvFilter::new("scrape_guardrails=debug,info"),
            2 => EnvFilter::new("scrape_guardrails=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().with_current_span(true).init(),
    }
}

/// Output paths given on the command line, overriding the config file
#[derive(Debug, Default)]
struct OutputOverrides {
    out: Option<PathBuf>,
    dead_letter: Option<PathBuf>,
    health: Option<PathBuf>,
    cache: Option<PathBuf>,
}

impl OutputOverrides {
    fn apply(self, config: &mut Config) {
        let output = &mut config.output;
        if let Some(path) = self.out {
            output.data_path = path.display().to_string();
        }
        if let Some(path) = self.dead_letter {
            output.dead_letter_path = path.display().to_string();
        }
        if let Some(path) = self.health {
            output.health_path = path.display().to_string();
        }
        if let Some(path) = self.cache {
            output.cache_dir = path.display().to_string();
        }
    }
}

/// Handles `run`: loads config and URLs, then drives the orchestrator
async fn handle_run(
    pipeline_name: &str,
    urls_file: &Path,
    overrides: OutputOverrides,
    config_path: Option<&Path>,
) -> Result<u8> {
    let mut config = match config_path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };
    overrides.apply(&mut config);
    scrape_guardrails::config::validate(&config).context("invalid configuration")?;

    let pipeline = config
        .pipeline(pipeline_name)
        .ok_or_else(|| GuardError::UnknownPipeline(pipeline_name.to_string()))
        .with_context(|| format!("available pipelines: {}", config.pipeline_names().join(", ")))?;

    let urls = load_url_list(urls_file)?;
    tracing::info!("Loaded {} URLs from {}", urls.len(), urls_file.display());

    let summary = Orchestrator::new(&config, pipeline)?.run(urls).await?;

    println!(
        "run {}: ok={} failed={} total={} struct_changes={}",
        summary.run_id, summary.ok, summary.failed, summary.total, summary.struct_changes
    );
    Ok(EXIT_OK)
}

/// Handles `triage`: ranks dead letters by error message
fn handle_triage(dead_letter: &Path) -> Result<u8> {
    match load_triage(dead_letter)? {
        Some(entries) => {
            print_triage(&entries);
            Ok(EXIT_OK)
        }
        None => {
            println!("No dead-letter file at {}", dead_letter.display());
            Ok(EXIT_NO_DEAD_LETTER)
        }
    }
}

/// Handles `diffs`: lists cached snapshots
fn handle_diffs(cache: &Path) -> Result<u8> {
    match list_snapshots(cache)? {
        Some(names) => {
            println!("Snapshots cached: {}", names.len());
            for name in names.iter().take(DIFFS_PREVIEW) {
                println!("  - {}", name);
            }
        }
        None => println!("No cache directory at {}", cache.display()),
    }
    Ok(EXIT_OK)
}
