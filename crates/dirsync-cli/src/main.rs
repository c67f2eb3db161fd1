//! dirsync - periodic one-way directory synchronization
//!
//! Keeps a destination directory identical to a source directory, repeating
//! the synchronization on a fixed interval until interrupted.

mod display;

use anyhow::{Context, Result};
use clap::Parser;
use dirsync_config::{Config, ConfigLoader};
use dirsync_sync::{ConsoleSink, FileSink, SinkSet, SyncEngine, SyncOptions, SyncScheduler};
use dirsync_types::{HashAlgorithm, SyncEndpoint, SyncInterval};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// dirsync - periodic one-way directory synchronization
#[derive(Parser, Debug)]
#[command(
    name = "dirsync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Periodically make a destination directory mirror a source directory",
    long_about = "dirsync copies new and changed files, removes stale files and directories,\n\
                  and turns renamed files into moves instead of fresh copies. Passes repeat\n\
                  every INTERVAL_MINUTES (default 30) until interrupted with Ctrl-C."
)]
struct Cli {
    /// Source directory
    source: PathBuf,

    /// Destination directory
    destination: PathBuf,

    /// Minutes between passes (invalid values fall back to 30)
    #[arg(value_name = "INTERVAL_MINUTES")]
    interval: Option<String>,

    /// File that receives a copy of every log line
    #[arg(value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,

    /// Dry run - show what would be done
    #[arg(long)]
    dry_run: bool,

    /// Copy and delete instead of detecting renamed files
    #[arg(long)]
    no_moves: bool,

    /// Run all actions of a pass in one batch instead of phases
    #[arg(long)]
    unphased: bool,

    /// Digest used to compare file contents
    #[arg(long, value_name = "md5|blake3")]
    hash: Option<HashAlgorithm>,

    /// Maximum concurrent actions per phase (0 = unbounded)
    #[arg(short = 'j', long)]
    max_concurrent: Option<usize>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Quiet mode - only the log file receives messages
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    let interval_warning = apply_overrides(&mut config, &cli);
    config
        .validate()
        .context("Invalid configuration after applying command-line arguments")?;

    init_logging(&log_level(&cli, &config))?;
    console::set_colors_enabled(config.logging.colored_output && !cli.no_color);

    info!("dirsync v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(message) = interval_warning {
        warn!("{}", message);
        display::display_warning(&message);
    }

    let source = config
        .sync
        .source
        .clone()
        .context("No source directory given")?;
    let destination = config
        .sync
        .destination
        .clone()
        .context("No destination directory given")?;

    let endpoint = SyncEndpoint::new(&source, &destination).map_err(|e| {
        display::display_error(&e.to_string());
        e
    })?;

    let sinks = build_sinks(&config, cli.quiet).await?;
    let engine = SyncEngine::new(
        endpoint,
        SyncOptions::from_config(&config),
        Arc::new(sinks),
    );

    if config.sync.dry_run && !cli.quiet {
        display::display_info("Dry run mode - no changes will be made");
    }

    let mut scheduler = SyncScheduler::new(engine, config.sync.interval);
    if cli.once {
        scheduler = scheduler.with_max_passes(1);
    }

    let summary = scheduler.run(shutdown_signal()).await;

    if !cli.quiet {
        display::print_schedule_summary(&summary);
    }

    if let Some(error) = &summary.fatal_error {
        display::display_error(error);
        anyhow::bail!("Synchronization stopped: {}", error);
    }
    if cli.once && summary.failed_passes > 0 {
        anyhow::bail!("Synchronization failed");
    }

    info!("dirsync stopped after {} passes", summary.passes);
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(ConfigLoader::load_default().unwrap_or_default()),
    }
}

/// Layer command-line arguments over the loaded configuration
///
/// Returns a warning when the interval argument had to be replaced.
fn apply_overrides(config: &mut Config, cli: &Cli) -> Option<String> {
    config.sync.source = Some(cli.source.clone());
    config.sync.destination = Some(cli.destination.clone());

    let (interval, warning) = resolve_interval(cli.interval.as_deref(), config.sync.interval);
    config.sync.interval = interval;

    if let Some(log_file) = &cli.log_file {
        config.logging.log_file = Some(log_file.clone());
    }
    if cli.dry_run {
        config.sync.dry_run = true;
    }
    if cli.no_moves {
        config.sync.detect_moves = false;
    }
    if cli.unphased {
        config.execution.phased = false;
    }
    if let Some(hash) = cli.hash {
        config.sync.hash_algorithm = hash;
    }
    if let Some(max_concurrent) = cli.max_concurrent {
        config.execution.max_concurrent_actions = max_concurrent;
    }

    warning
}

/// Parse the positional interval, falling back to the default on bad input
fn resolve_interval(raw: Option<&str>, configured: SyncInterval) -> (SyncInterval, Option<String>) {
    let Some(raw) = raw else {
        return (configured, None);
    };

    match raw.trim().parse::<u64>().map(SyncInterval::from_minutes) {
        Ok(Ok(interval)) => (interval, None),
        _ => {
            let fallback = SyncInterval::default();
            (
                fallback,
                Some(format!(
                    "Invalid interval '{}', using default of {}",
                    raw, fallback
                )),
            )
        }
    }
}

fn log_level(cli: &Cli, config: &Config) -> String {
    if cli.debug {
        "debug".to_string()
    } else if cli.verbose {
        "info".to_string()
    } else if cli.quiet {
        "error".to_string()
    } else {
        config.logging.level.clone()
    }
}

fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log filter")?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

async fn build_sinks(config: &Config, quiet: bool) -> Result<SinkSet> {
    let mut sinks = SinkSet::new().with_timestamps(config.logging.timestamps);
    if !quiet {
        sinks = sinks.with_sink(ConsoleSink::new());
    }
    if let Some(path) = &config.logging.log_file {
        sinks = sinks.with_sink(FileSink::new(path).await?);
    }
    Ok(sinks)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
