//! Feedhub - a feedback aggregation hub for analysis pipelines.
//!
//! Independent analysis tools report into one [`Aggregator`]: success
//! markers, partial credit, explanations and arbitrary labelled feedback.
//! The aggregator also carries the presentation context (suppressions,
//! group names and ordering), a per-tool results namespace, and a hook
//! registry for event callbacks.
//!
//! ```
//! use feedhub::{Aggregator, Remark};
//!
//! let mut agg = Aggregator::new();
//! agg.explain(Remark::new("Unused variable 'x'").at_line(3));
//! agg.give_partial(Some(0.5), Some("Half the tests pass"));
//! agg.suppress("Instructions", "Guidance");
//!
//! assert_eq!(agg.feedback().len(), 2);
//! assert!(agg.suppressions().is_suppressed("instructions", "guidance"));
//! ```

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod scanner;
pub mod session;

pub use aggregator::{
    Aggregator, GroupOrder, Hook, Remark, ResultsNamespace, SuppressedLabel, SuppressionScope,
    SuppressionTable,
};
pub use error::{FeedbackError, Result};
pub use models::{FeedbackFields, FeedbackItem, FeedbackSummary, GroupId, Payload, Priority};
