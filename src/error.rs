//! Error types for the feedback hub.
//!
//! The aggregator itself tolerates unknown keys everywhere; these errors
//! only surface from hook execution and from the replay driver.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the library.
#[derive(Error, Debug)]
pub enum FeedbackError {
    /// Nested hook execution went deeper than the configured limit.
    #[error("Hook depth exceeded while executing '{event}' (depth {depth})")]
    HookDepthExceeded { event: String, depth: usize },

    /// A replay log line could not be parsed.
    #[error("Invalid operation on line {line}: {source}")]
    LogParse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A replay log could not be read from disk.
    #[error("Failed to read log {path}: {source}")]
    LogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input path is neither a log file nor a directory.
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FeedbackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_depth_message() {
        let err = FeedbackError::HookDepthExceeded {
            event: "source.next_section".to_string(),
            depth: 64,
        };
        let msg = err.to_string();
        assert!(msg.contains("source.next_section"));
        assert!(msg.contains("64"));
    }

    #[test]
    fn test_log_parse_carries_line() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = FeedbackError::LogParse { line: 7, source };
        assert!(err.to_string().starts_with("Invalid operation on line 7"));
    }
}
