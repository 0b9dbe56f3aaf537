//! Replay log discovery.
//!
//! This module finds replay logs under an input directory, respecting
//! configuration for extensions, excludes, and file size limits.

use crate::error::{FeedbackError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Configuration for log scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extensions to include (e.g., ["jsonl"])
    pub extensions: Vec<String>,
    /// Directory or file names to skip
    pub excludes: Vec<String>,
    /// Maximum file size in bytes
    pub max_file_size: u64,
    /// Maximum number of logs to collect
    pub max_files: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["jsonl".to_string()],
            excludes: vec!["target".to_string(), "node_modules".to_string()],
            max_file_size: 10 * 1024 * 1024,
            max_files: None,
        }
    }
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            excludes: config.excludes.clone(),
            max_file_size: config.max_file_size,
            max_files: Some(config.max_files),
        }
    }
}

/// A discovered replay log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLog {
    /// Full path to the log.
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

/// Scanner for replay logs.
pub struct LogScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl LogScanner {
    /// Create a new log scanner.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// Collect matching logs, sorted by path.
    ///
    /// A file root is returned as-is, whatever its extension.
    pub fn scan(&self) -> Result<Vec<ScannedLog>> {
        if self.root.is_file() {
            let size = fs::metadata(&self.root)
                .map(|m| m.len())
                .map_err(|source| FeedbackError::LogRead {
                    path: self.root.clone(),
                    source,
                })?;
            return Ok(vec![ScannedLog {
                path: self.root.clone(),
                size,
            }]);
        }

        if !self.root.is_dir() {
            return Err(FeedbackError::InputNotFound(self.root.clone()));
        }

        let mut logs: Vec<ScannedLog> = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Cannot read entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && self.matches(entry.path()))
            .filter_map(|entry| {
                let size = entry.metadata().ok()?.len();
                if size > self.config.max_file_size {
                    warn!("Skipping oversized log: {}", entry.path().display());
                    return None;
                }
                Some(ScannedLog {
                    path: entry.into_path(),
                    size,
                })
            })
            .collect();

        logs.sort_by(|a, b| a.path.cmp(&b.path));

        if let Some(max) = self.config.max_files {
            logs.truncate(max);
        }

        Ok(logs)
    }

    /// Check if a path has one of the configured extensions.
    pub fn matches(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.config.extensions.iter().any(|e| e == ext)
    }

    /// Hidden entries and configured names are skipped.
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || self.config.excludes.iter().any(|pattern| name == pattern.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_directory_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("b.jsonl"), "{}");
        write(&dir.path().join("a.jsonl"), "{}");
        write(&dir.path().join("nested/c.jsonl"), "{}");
        write(&dir.path().join("notes.txt"), "ignored");

        let scanner = LogScanner::new(dir.path().to_path_buf(), ScanConfig::default());
        let logs = scanner.scan().unwrap();
        let names: Vec<_> = logs
            .iter()
            .map(|l| l.path.strip_prefix(dir.path()).unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "a.jsonl");
        assert_eq!(names[1], "b.jsonl");
        assert!(names[2].ends_with("c.jsonl"));
    }

    #[test]
    fn test_scan_skips_excluded_and_hidden() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("keep.jsonl"), "{}");
        write(&dir.path().join("target/skip.jsonl"), "{}");
        write(&dir.path().join(".cache/skip.jsonl"), "{}");

        let scanner = LogScanner::new(dir.path().to_path_buf(), ScanConfig::default());
        let logs = scanner.scan().unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].path.ends_with("keep.jsonl"));
    }

    #[test]
    fn test_scan_respects_limits() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("1.jsonl"), "{}");
        write(&dir.path().join("2.jsonl"), "{}");
        write(&dir.path().join("big.jsonl"), &"x".repeat(64));

        let config = ScanConfig {
            max_file_size: 16,
            max_files: Some(1),
            ..Default::default()
        };
        let logs = LogScanner::new(dir.path().to_path_buf(), config).scan().unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].path.ends_with("1.jsonl"));
    }

    #[test]
    fn test_scan_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        write(&path, "{}");

        let logs = LogScanner::new(path.clone(), ScanConfig::default()).scan().unwrap();
        assert_eq!(logs, vec![ScannedLog { path, size: 2 }]);
    }

    #[test]
    fn test_scan_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            LogScanner::new(missing, ScanConfig::default()).scan(),
            Err(FeedbackError::InputNotFound(_))
        ));
    }
}
