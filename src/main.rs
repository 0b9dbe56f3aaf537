//! Feedhub - feedback aggregation hub
//!
//! Replays recorded tool feedback through a single aggregator and
//! renders the resolved feedback as a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad input, unparsable log, failing hook, etc.)
//!   2 - No visible success marker with --fail-unless-success

use anyhow::{Context, Result};
use chrono::Utc;
use feedhub::cli::{Args, OutputFormat};
use feedhub::config::{Config, CONFIG_FILE};
use feedhub::report::{self, Report, ReportMetadata, RenderOptions};
use feedhub::scanner::{self, LogScanner, ScannedLog};
use feedhub::session::{self, ReplayStats};
use feedhub::Aggregator;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging so `[general] verbose` can set the level
    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(config.log_level(&args));

    info!("Feedhub v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match origin {
        ConfigOrigin::File(path) => info!("Loaded config from {}", path.display()),
        ConfigOrigin::Defaults => debug!("No config file found, using defaults"),
        ConfigOrigin::Fallback(reason) => warn!("Failed to load config: {}", reason),
    }

    match run(args, config) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .feedhub.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize suppressions, group order, and more.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Replay every log and render the report. Returns exit code (0 or 2).
fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let input = args
        .input
        .clone()
        .context("An input log or directory is required")?;

    // Step 1: Find the replay logs
    let scan_config = scanner::ScanConfig::from(&config.scanner);
    let logs = LogScanner::new(input.clone(), scan_config)
        .scan()
        .with_context(|| format!("Failed to scan {}", input.display()))?;

    if args.dry_run {
        return handle_dry_run(&logs);
    }

    if logs.is_empty() {
        warn!("No replay logs found under {}", input.display());
    }

    // Step 2: Replay into one aggregator
    let mut agg = Aggregator::new();
    config.prepare(&mut agg);

    let stats = replay_logs(&mut agg, &logs, args.quiet)?;

    // After replay, so a `clear` in a log cannot drop configured rules
    config.apply_to(&mut agg);
    info!(
        logs = stats.logs,
        operations = stats.operations,
        "Replay finished"
    );

    // Step 3: Build the report
    let metadata = ReportMetadata {
        source: input.display().to_string(),
        generated_at: Utc::now(),
        logs_replayed: stats.logs,
        operations: stats.operations,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    let report = Report::from_aggregator(&agg, metadata);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, &RenderOptions::from(&config.report))
        }
    };

    if args.stdout {
        println!("{}", output);
    } else {
        let path = PathBuf::from(&config.general.output);
        report::write_report(&output, &path)?;

        if !args.quiet {
            println!("\n📊 Feedback Summary:");
            println!("   Logs replayed: {}", stats.logs);
            println!("   {}", report::summary_line(&report));
            if let Some(score) = report.feedback.score {
                println!("   Score: {:.0}%", score * 100.0);
            }
            println!("   Duration: {:.1}s", report.metadata.duration_seconds);
            println!("\n✅ Report saved to: {}", path.display());
        }
    }

    if args.fail_unless_success && !report.feedback.success {
        eprintln!("\n⛔ No visible success marker was recorded. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Replay each log in order, stopping at the first failure.
fn replay_logs(agg: &mut Aggregator, logs: &[ScannedLog], quiet: bool) -> Result<ReplayStats> {
    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(logs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    };

    let mut stats = ReplayStats::default();

    for log in logs {
        progress.set_message(log.path.display().to_string());

        let ops = session::load_log(&log.path)
            .with_context(|| format!("Failed to load {}", log.path.display()))?;
        let applied = session::replay(agg, &ops)
            .with_context(|| format!("Replay of {} failed", log.path.display()))?;

        debug!(path = %log.path.display(), operations = applied, "Log replayed");
        stats.logs += 1;
        stats.operations += applied;
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(stats)
}

/// Handle --dry-run: list the logs that would be replayed, then exit.
fn handle_dry_run(logs: &[ScannedLog]) -> Result<i32> {
    println!("\n🔍 Dry run: scanning for replay logs...\n");

    if logs.is_empty() {
        println!("   No matching replay logs found.");
    } else {
        println!("   Found {} logs that would be replayed:\n", logs.len());
        for log in logs {
            println!("     📄 {} ({} bytes)", log.path.display(), log.size);
        }
        println!("\n   Total: {} logs", logs.len());
    }

    println!("\n✅ Dry run complete. Nothing was replayed.");
    Ok(0)
}

/// Where the configuration came from, reported once logging is up.
enum ConfigOrigin {
    File(PathBuf),
    Defaults,
    Fallback(String),
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::File(config_path.clone())));
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::File(PathBuf::from(CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), ConfigOrigin::Defaults)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Fallback(format!("{:#}", e)))),
    }
}
