//! Markdown and JSON report generation.
//!
//! This module renders a resolved run into a human-readable Markdown
//! document or a machine-readable JSON document.

use super::{Report, ReportMetadata, ResolvedSection};
use crate::aggregator::SuppressedLabel;
use crate::models::{FeedbackItem, Priority};
use anyhow::{Context, Result};
use std::path::Path;

/// Rendering switches, usually taken from the `[report]` config table.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Show source line references next to messages.
    pub include_lines: bool,
    /// List the tools that stored data in the namespace.
    pub include_namespace: bool,
    /// Show the score and success status.
    pub include_score: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_lines: true,
            include_namespace: false,
            include_score: true,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &RenderOptions) -> String {
    let mut output = String::new();

    output.push_str("# Feedback Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report, options));
    output.push_str(&generate_summary_section(report, options));
    output.push_str(&generate_feedback_section(&report.feedback.sections, options));
    output.push_str(&generate_suppressions_section(report));

    if options.include_namespace {
        output.push_str(&generate_namespace_section(report));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Logs Replayed:** {}\n", metadata.logs_replayed));
    section.push_str(&format!("- **Operations:** {}\n", metadata.operations));
    section.push_str(&format!(
        "- **Replay Duration:** {:.3}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn anchor(title: &str) -> String {
    title.replace(['/', '.', ' '], "-").to_lowercase()
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report, options: &RenderOptions) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [Feedback](#feedback)\n");

    for section in &report.feedback.sections {
        toc.push_str(&format!("  - [{}](#{})\n", section.title, anchor(&section.title)));
    }

    if !report.suppressions.is_empty() {
        toc.push_str("- [Suppressions](#suppressions)\n");
    }
    if options.include_namespace && !report.namespace.is_empty() {
        toc.push_str("- [Tool Data](#tool-data)\n");
    }

    toc.push('\n');

    toc
}

/// Generate the summary section.
fn generate_summary_section(report: &Report, options: &RenderOptions) -> String {
    let mut section = String::new();
    let feedback = &report.feedback;

    section.push_str("## Summary\n\n");

    if options.include_score {
        match feedback.score {
            Some(score) => {
                let status = if feedback.success { "✅ Complete" } else { "⏳ Incomplete" };
                section.push_str(&format!("**Status:** {}\n\n", status));
                section.push_str(&format!("**Score:** {:.0}%\n\n", score * 100.0));
            }
            None => section.push_str("*Correctness is hidden for this run.*\n\n"),
        }
    }

    section.push_str("| Shown | Suppressed | **Total** |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | **{}** |\n\n",
        feedback.shown(),
        feedback.suppressed,
        report.summary.total
    ));

    section.push_str(&generate_count_table("Feedback by Label", "Label", &report.summary.by_label));
    section.push_str(&generate_count_table(
        "Feedback by Category",
        "Category",
        &report.summary.by_category,
    ));

    section
}

fn generate_count_table(
    heading: &str,
    column: &str,
    counts: &std::collections::BTreeMap<String, usize>,
) -> String {
    if counts.is_empty() {
        return String::new();
    }

    let mut table = String::new();
    table.push_str(&format!("### {}\n\n", heading));
    table.push_str(&format!("| {} | Count |\n", column));
    table.push_str("|:---|:---:|\n");

    let mut rows: Vec<_> = counts.iter().collect();
    rows.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

    for (name, count) in rows {
        table.push_str(&format!("| {} | {} |\n", name, count));
    }
    table.push('\n');

    table
}

/// Generate the feedback section.
fn generate_feedback_section(sections: &[ResolvedSection], options: &RenderOptions) -> String {
    let mut output = String::new();

    output.push_str("## Feedback\n\n");

    if sections.is_empty() {
        output.push_str("No feedback to show.\n\n");
        return output;
    }

    for section in sections {
        output.push_str(&format!(
            "### {} {{#{}}}\n\n",
            section.title,
            anchor(&section.title)
        ));
        for item in &section.items {
            output.push_str(&generate_item_block(item, options));
        }
    }

    output
}

fn priority_badge(priority: Option<&Priority>) -> &'static str {
    match priority {
        Some(Priority::Positive) => "🟢",
        Some(Priority::High) => "🔴",
        Some(Priority::Medium) => "🟡",
        Some(Priority::Instructions) => "📘",
        Some(Priority::Student) => "💬",
        Some(Priority::Low) | Some(Priority::Other(_)) | None => "⚪",
    }
}

/// Generate a single feedback item block.
fn generate_item_block(item: &FeedbackItem, options: &RenderOptions) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "- {} **{}**",
        priority_badge(item.priority.as_ref()),
        item.label
    ));

    if let Some(message) = item.message() {
        block.push_str(&format!(": {}", message));
    }

    if options.include_lines {
        if let Some(line) = item.line() {
            block.push_str(&format!(" *(line {})*", line));
        }
    }

    if let Some(performance) = item.performance {
        block.push_str(&format!(" · partial credit {:.0}%", performance * 100.0));
    }
    if item.result == Some(true) {
        block.push_str(" · complete");
    }

    block.push('\n');

    block
}

/// Generate the suppressions section.
fn generate_suppressions_section(report: &Report) -> String {
    if report.suppressions.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Suppressions\n\n");
    section.push_str("| Category | Labels |\n");
    section.push_str("|:---|:---|\n");

    for (category, labels) in report.suppressions.iter() {
        let rendered: Vec<String> = labels
            .iter()
            .map(|label| match label {
                SuppressedLabel::All => "*all*".to_string(),
                SuppressedLabel::Label(l) => format!("`{}`", l),
            })
            .collect();
        let rendered = if rendered.is_empty() {
            "*correctness*".to_string()
        } else {
            rendered.join(", ")
        };
        section.push_str(&format!("| {} | {} |\n", category, rendered));
    }
    section.push('\n');

    section
}

/// Generate the tool data section.
fn generate_namespace_section(report: &Report) -> String {
    if report.namespace.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Tool Data\n\n");
    for tool in report.namespace.keys() {
        section.push_str(&format!("- `{}`\n", tool));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by feedhub*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered output to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

/// One-line console summary of a run.
pub fn summary_line(report: &Report) -> String {
    format!(
        "{} items ({} shown, {} suppressed), {} success markers",
        report.summary.total,
        report.feedback.shown(),
        report.feedback.suppressed,
        report.summary.successes
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{Aggregator, Remark};
    use crate::models::GroupId;
    use chrono::Utc;

    fn create_test_report() -> Report {
        let mut agg = Aggregator::new();
        agg.name_group(GroupId::Index(1), "Part One");
        agg.set_group(Some(GroupId::Index(1)));
        agg.explain(Remark::new("Unused variable 'x'").at_line(4));
        agg.give_partial(Some(0.5), Some("Half the tests pass"));
        agg.set_group(None);
        agg.guidance("Remember to return a value");
        agg.suppress("runtime", "Name_Error");
        agg.set("parser", serde_json::json!({"ok": true}));

        let metadata = ReportMetadata {
            source: "fixtures/session.jsonl".to_string(),
            generated_at: Utc::now(),
            logs_replayed: 1,
            operations: 7,
            duration_seconds: 0.01,
        };

        Report::from_aggregator(&agg, metadata)
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &RenderOptions::default());

        assert!(markdown.contains("# Feedback Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("### Part One"));
        assert!(markdown.contains("Unused variable 'x'"));
        assert!(markdown.contains("*(line 4)*"));
        assert!(markdown.contains("**Score:** 50%"));
        assert!(markdown.contains("| runtime | `name_error` |"));
        assert!(!markdown.contains("## Tool Data"));
    }

    #[test]
    fn test_markdown_options() {
        let report = create_test_report();
        let options = RenderOptions {
            include_lines: false,
            include_namespace: true,
            include_score: false,
        };
        let markdown = generate_markdown_report(&report, &options);

        assert!(!markdown.contains("*(line 4)*"));
        assert!(!markdown.contains("**Score:**"));
        assert!(markdown.contains("## Tool Data"));
        assert!(markdown.contains("- `parser`"));
    }

    #[test]
    fn test_ungrouped_section_comes_first() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &RenderOptions::default());

        let general = markdown.find("### General").unwrap();
        let part_one = markdown.find("### Part One").unwrap();
        assert!(general < part_one);
    }

    #[test]
    fn test_generate_item_block() {
        let report = create_test_report();
        let item = &report.feedback.sections[1].items[1];
        let block = generate_item_block(item, &RenderOptions::default());

        assert!(block.contains("**give_partial**"));
        assert!(block.contains("Half the tests pass"));
        assert!(block.contains("partial credit 50%"));
    }

    #[test]
    fn test_empty_report() {
        let metadata = ReportMetadata {
            source: "empty".to_string(),
            generated_at: Utc::now(),
            logs_replayed: 0,
            operations: 0,
            duration_seconds: 0.0,
        };
        let report = Report::from_aggregator(&Aggregator::new(), metadata);
        let markdown = generate_markdown_report(&report, &RenderOptions::default());

        assert!(markdown.contains("No feedback to show."));
        assert!(!markdown.contains("## Suppressions"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"sections\""));
        assert!(json.contains("\"suppressions\""));
        assert!(json.contains("\"name_error\""));
    }

    #[test]
    fn test_summary_line() {
        let report = create_test_report();
        assert_eq!(
            summary_line(&report),
            "3 items (3 shown, 0 suppressed), 0 success markers"
        );
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        write_report("# Feedback Report\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Feedback Report\n");
    }
}
