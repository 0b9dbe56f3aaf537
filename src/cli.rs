//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Feedhub - feedback aggregation hub for analysis pipelines
///
/// Replays recorded tool feedback through one aggregator, applies
/// suppressions and group ordering, and renders a Markdown/JSON report.
///
/// Examples:
///   feedhub ./runs/submission-42
///   feedhub run.jsonl --format json --stdout
///   feedhub run.jsonl --suppress instructor:unused_variable --group-order 3,1,2
///   feedhub ./runs --dry-run
///   feedhub --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Replay log, or directory of logs, to aggregate
    ///
    /// Directories are scanned recursively for *.jsonl files; all logs
    /// feed one aggregator in path order.
    #[arg(value_name = "INPUT", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to the config file setting (feedback_report.md).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the report to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .feedhub.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "FEEDHUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Maximum number of logs to replay
    #[arg(long, value_name = "COUNT")]
    pub max_files: Option<usize>,

    /// Explicit group order (comma-separated)
    ///
    /// Example: --group-order 3,1,intro
    ///
    /// Numbers are group indices; quote a numeric name ('007') to keep it a name.
    #[arg(long, value_name = "GROUPS", value_delimiter = ',')]
    pub group_order: Option<Vec<String>>,

    /// Extra suppressions (comma-separated category or category:label)
    ///
    /// Example: --suppress instructions,runtime:name_error
    #[arg(long, value_name = "RULES", value_delimiter = ',')]
    pub suppress: Option<Vec<String>>,

    /// Maximum nesting of hook execution (0 disables the limit)
    #[arg(long, value_name = "DEPTH")]
    pub max_hook_depth: Option<usize>,

    /// List tools that stored namespace data in the report
    #[arg(long)]
    pub include_namespace: bool,

    /// Omit line references from the report
    #[arg(long)]
    pub no_lines: bool,

    /// Exit with code 2 unless a visible success marker was recorded
    #[arg(long)]
    pub fail_unless_success: bool,

    /// Dry run: list the logs that would be replayed and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .feedhub.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let Some(ref input) = self.input else {
            return Err("An input log or directory is required".to_string());
        };

        if !input.exists() {
            return Err(format!("Input does not exist: {}", input.display()));
        }

        if self.max_files == Some(0) {
            return Err("Max files must be at least 1".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.stdout && self.output.is_some() {
            return Err("Cannot use both --stdout and --output".to_string());
        }

        if let Some(ref rules) = self.suppress {
            if rules.iter().any(|rule| rule.trim().is_empty() || rule.starts_with(':')) {
                return Err("Suppression rules need a category".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            input: Some(PathBuf::from(".")),
            output: None,
            stdout: false,
            config: None,
            verbose: false,
            quiet: false,
            format: OutputFormat::Markdown,
            max_files: None,
            group_order: None,
            suppress: None,
            max_hook_depth: None,
            include_namespace: false,
            no_lines: false,
            fail_unless_success: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "feedhub",
            "run.jsonl",
            "--format",
            "json",
            "--suppress",
            "instructions,runtime:name_error",
            "--group-order",
            "3,1",
        ])
        .unwrap();

        assert_eq!(args.input, Some(PathBuf::from("run.jsonl")));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(
            args.suppress,
            Some(vec!["instructions".to_string(), "runtime:name_error".to_string()])
        );
        assert_eq!(args.group_order, Some(vec!["3".to_string(), "1".to_string()]));
    }

    #[test]
    fn test_input_required_unless_init_config() {
        assert!(Args::try_parse_from(["feedhub"]).is_err());
        assert!(Args::try_parse_from(["feedhub", "--init-config"]).is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("/definitely/not/here.jsonl"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.stdout = true;
        args.output = Some(PathBuf::from("out.md"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_bad_suppression() {
        let mut args = make_args();
        args.suppress = Some(vec![":label".to_string()]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
