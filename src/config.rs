//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.feedhub.toml` files.

use crate::aggregator::{Aggregator, GroupOrder, SuppressedLabel};
use crate::models::GroupId;
use crate::report::RenderOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".feedhub.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Suppressions applied before replay.
    #[serde(default)]
    pub suppress: Vec<SuppressRule>,

    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Scanner settings.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Group names and ordering applied before replay.
    #[serde(default)]
    pub groups: GroupsConfig,

    /// Hook execution settings.
    #[serde(default)]
    pub hooks: HooksConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "feedback_report.md".to_string()
}

/// Replay log scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Maximum logs to replay.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// File extensions to include.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Names to exclude.
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,

    /// Maximum log size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            extensions: default_extensions(),
            excludes: default_excludes(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_max_files() -> usize {
    1000
}

fn default_extensions() -> Vec<String> {
    vec!["jsonl".to_string()]
}

fn default_excludes() -> Vec<String> {
    vec!["target", "node_modules", "__pycache__"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Show line references next to messages.
    #[serde(default = "default_true")]
    pub include_lines: bool,

    /// List tools that stored namespace data.
    #[serde(default)]
    pub include_namespace: bool,

    /// Show the score and success status.
    #[serde(default = "default_true")]
    pub include_score: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_lines: true,
            include_namespace: false,
            include_score: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl From<&ReportConfig> for RenderOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            include_lines: config.include_lines,
            include_namespace: config.include_namespace,
            include_score: config.include_score,
        }
    }
}

/// Group presentation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupsConfig {
    /// Explicit group order; empty means natural order.
    #[serde(default)]
    pub order: Vec<GroupId>,

    /// Display names keyed by group.
    #[serde(default)]
    pub names: BTreeMap<String, String>,
}

/// A suppression to apply to every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuppressRule {
    pub category: String,
    /// Absent means the whole category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl SuppressRule {
    /// Parse `category` or `category:label`.
    pub fn parse(rule: &str) -> Self {
        match rule.split_once(':') {
            Some((category, label)) => Self {
                category: category.trim().to_string(),
                label: Some(label.trim().to_string()),
            },
            None => Self {
                category: rule.trim().to_string(),
                label: None,
            },
        }
    }
}

/// Hook execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Maximum nesting of hook execution; 0 disables the limit.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl HooksConfig {
    /// Depth limit for the aggregator; `None` when disabled.
    pub fn limit(&self) -> Option<usize> {
        match self.max_depth {
            0 => None,
            n => Some(n),
        }
    }
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    crate::aggregator::DEFAULT_MAX_HOOK_DEPTH
}

/// Numeric keys name numbered groups; anything else is a named group.
///
/// A quoted key (`'007'` or `"007"`) is always a name, so numeric-looking
/// names stay distinct from indices.
pub fn parse_group_key(key: &str) -> GroupId {
    let key = key.trim();
    for quote in ['\'', '"'] {
        if let Some(name) = key
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return GroupId::Name(name.to_string());
        }
    }

    key.parse::<i64>()
        .map(GroupId::Index)
        .unwrap_or_else(|_| GroupId::Name(key.to_string()))
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(max_files) = args.max_files {
            self.scanner.max_files = max_files;
        }

        if let Some(ref order) = args.group_order {
            self.groups.order = order.iter().map(|g| parse_group_key(g)).collect();
        }

        if let Some(ref rules) = args.suppress {
            self.suppress
                .extend(rules.iter().map(|rule| SuppressRule::parse(rule)));
        }

        if let Some(depth) = args.max_hook_depth {
            self.hooks.max_depth = depth;
        }

        if args.include_namespace {
            self.report.include_namespace = true;
        }
        if args.no_lines {
            self.report.include_lines = false;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level from the CLI flags and `[general] verbose`.
    ///
    /// `--quiet` wins over a verbose config file.
    pub fn log_level(&self, args: &crate::cli::Args) -> tracing::Level {
        if args.quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            args.log_level()
        }
    }

    /// Settings a replay needs before its first operation.
    pub fn prepare(&self, agg: &mut Aggregator) {
        agg.set_max_hook_depth(self.hooks.limit());
    }

    /// Apply the configured groups, suppressions and hook limit.
    ///
    /// Call this after replay: a `clear` operation in a log resets the
    /// aggregator, and configured rules must still hold for the report.
    pub fn apply_to(&self, agg: &mut Aggregator) {
        if !self.groups.order.is_empty() {
            agg.set_group_order(GroupOrder::Explicit(self.groups.order.clone()));
        }

        for (key, name) in &self.groups.names {
            agg.name_group(parse_group_key(key), name);
        }

        for rule in &self.suppress {
            agg.suppress(&rule.category, SuppressedLabel::from(rule.label.as_deref()));
        }

        self.prepare(agg);
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
