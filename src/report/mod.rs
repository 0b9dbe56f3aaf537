//! Report building and rendering.

pub mod generator;
pub mod resolver;

pub use generator::{
    generate_json_report, generate_markdown_report, summary_line, write_report, RenderOptions,
};
pub use resolver::{resolve, ResolvedFeedback, ResolvedSection};

use crate::aggregator::{Aggregator, ResultsNamespace, SuppressionTable};
use crate::models::FeedbackSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata about a rendered run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Input the run was replayed from.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    /// Number of replay logs fed into the aggregator.
    pub logs_replayed: usize,
    /// Number of operations applied.
    pub operations: usize,
    pub duration_seconds: f64,
}

/// A finished run, ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// Statistics over all feedback, suppressed or not.
    pub summary: FeedbackSummary,
    pub feedback: ResolvedFeedback,
    pub suppressions: SuppressionTable,
    pub namespace: ResultsNamespace,
}

impl Report {
    /// Snapshot an aggregator into a report.
    pub fn from_aggregator(agg: &Aggregator, metadata: ReportMetadata) -> Self {
        Self {
            metadata,
            summary: agg.summary(),
            feedback: resolve(agg),
            suppressions: agg.suppressions().clone(),
            namespace: agg.namespace().clone(),
        }
    }
}
