//! Presentation-side resolution of an aggregator's state.
//!
//! Applies the suppression table, buckets feedback by group, orders the
//! groups and swaps in display names. The aggregator is only read.

use crate::aggregator::Aggregator;
use crate::models::{FeedbackItem, GroupId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Title used for feedback that belongs to no group.
pub const UNGROUPED_TITLE: &str = "General";

/// Feedback shown for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    /// Display name, or the group identifier.
    pub title: String,
    pub items: Vec<FeedbackItem>,
}

/// Everything a renderer needs from a finished run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedFeedback {
    pub sections: Vec<ResolvedSection>,
    /// Items hidden by suppression.
    pub suppressed: usize,
    /// Whether a visible success marker was recorded.
    pub success: bool,
    /// Combined score in `[0, 1]`; absent when correctness is hidden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl ResolvedFeedback {
    /// Number of items that survived suppression.
    pub fn shown(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Whether the aggregator's suppressions hide this item.
pub fn is_hidden(agg: &Aggregator, item: &FeedbackItem) -> bool {
    let table = agg.suppressions();

    if table.hides_correctness() && item.is_correctness_signal() {
        return true;
    }

    item.category
        .as_deref()
        .is_some_and(|category| table.is_suppressed(category, &item.label))
}

/// Resolve the aggregator's feedback for presentation.
pub fn resolve(agg: &Aggregator) -> ResolvedFeedback {
    let mut ungrouped = Vec::new();
    let mut grouped: BTreeMap<GroupId, Vec<FeedbackItem>> = BTreeMap::new();
    let mut suppressed = 0;

    for item in agg.feedback() {
        if is_hidden(agg, item) {
            suppressed += 1;
            continue;
        }

        match item.group {
            Some(ref group) => grouped.entry(group.clone()).or_default().push(item.clone()),
            None => ungrouped.push(item.clone()),
        }
    }

    let visible = ungrouped.iter().chain(grouped.values().flatten());
    let success = visible.clone().any(|item| item.result == Some(true));
    let score = if agg.suppressions().hides_correctness() {
        None
    } else if success {
        Some(1.0)
    } else {
        let partial: f64 = visible.filter_map(|item| item.performance).sum();
        Some(partial.clamp(0.0, 1.0))
    };

    let mut order: Vec<GroupId> = grouped.keys().cloned().collect();
    agg.group_order().sort(&mut order);

    let mut sections = Vec::new();
    if !ungrouped.is_empty() {
        sections.push(ResolvedSection {
            group: None,
            title: UNGROUPED_TITLE.to_string(),
            items: ungrouped,
        });
    }

    let context = agg.group_context();
    for group in order {
        let items = grouped.remove(&group).unwrap_or_default();
        sections.push(ResolvedSection {
            title: context.display_name(&group),
            group: Some(group),
            items,
        });
    }

    ResolvedFeedback {
        sections,
        suppressed,
        success,
        score,
    }
}
