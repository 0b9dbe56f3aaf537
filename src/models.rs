//! Data models for the feedback hub.
//!
//! This module contains the core data structures shared by the aggregator,
//! the report resolver and the replay driver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordering/severity hint attached to a feedback item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    /// Praise or correctness signals.
    Positive,
    /// Default priority for instructor explanations.
    Medium,
    /// Gentle, student-facing remarks.
    Student,
    /// Guidance that restates the instructions.
    Instructions,
    High,
    Low,
    /// Any tool-specific priority.
    Other(String),
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Positive => write!(f, "positive"),
            Priority::Medium => write!(f, "medium"),
            Priority::Student => write!(f, "student"),
            Priority::Instructions => write!(f, "instructions"),
            Priority::High => write!(f, "high"),
            Priority::Low => write!(f, "low"),
            Priority::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Priority {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "positive" => Priority::Positive,
            "medium" => Priority::Medium,
            "student" => Priority::Student,
            "instructions" => Priority::Instructions,
            "high" => Priority::High,
            "low" => Priority::Low,
            other => Priority::Other(other.to_string()),
        }
    }
}

impl From<String> for Priority {
    fn from(s: String) -> Self {
        Priority::from(s.as_str())
    }
}

impl From<Priority> for String {
    fn from(p: Priority) -> Self {
        p.to_string()
    }
}

/// Identifier of a logical group (for example a section of a submission).
///
/// The derived ordering is the natural order of groups: numeric groups come
/// first, then named groups, each in their own natural order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupId {
    Index(i64),
    Name(String),
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupId::Index(i) => write!(f, "{}", i),
            GroupId::Name(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for GroupId {
    fn from(i: i64) -> Self {
        GroupId::Index(i)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        GroupId::Name(s.to_string())
    }
}

impl From<String> for GroupId {
    fn from(s: String) -> Self {
        GroupId::Name(s)
    }
}

/// A message with an optional source line, used for misconceptions and hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Payload {
    pub fn new(message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

/// Named fields passed to [`Aggregator::attach`](crate::Aggregator::attach).
///
/// Every field is optional. Tool-specific data that has no well-known slot
/// goes into `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackFields {
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub group: Option<GroupId>,
    pub result: Option<bool>,
    pub performance: Option<f64>,
    pub mistake: Option<String>,
    pub misconception: Option<Payload>,
    pub hint: Option<Payload>,
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl FeedbackFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(mut self, priority: impl Into<Priority>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// Pin the item to a group instead of the current one.
    pub fn in_group(mut self, group: impl Into<GroupId>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_result(mut self, result: bool) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_performance(mut self, performance: f64) -> Self {
        self.performance = Some(performance);
        self
    }

    pub fn with_mistake(mut self, mistake: impl Into<String>) -> Self {
        self.mistake = Some(mistake.into());
        self
    }

    pub fn with_misconception(mut self, misconception: Payload) -> Self {
        self.misconception = Some(misconception);
        self
    }

    pub fn with_hint(mut self, hint: Payload) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Add a tool-specific field.
    pub fn with_extra(mut self, key: &str, value: serde_json::Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }
}

/// One immutable unit of evaluative output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    /// Kind of feedback (e.g. "explain", "give_partial").
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Classification used for suppression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Group resolved when the item was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mistake: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub misconception: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<Payload>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl FeedbackItem {
    /// Build an item from attach fields, with the group already resolved.
    pub fn from_fields(label: &str, fields: FeedbackFields, group: Option<GroupId>) -> Self {
        Self {
            label: label.to_string(),
            priority: fields.priority,
            category: fields.category,
            group,
            result: fields.result,
            performance: fields.performance,
            mistake: fields.mistake,
            misconception: fields.misconception,
            hint: fields.hint,
            extra: fields.extra,
        }
    }

    /// Whether the item reports correctness (success or partial credit).
    pub fn is_correctness_signal(&self) -> bool {
        self.result.is_some() || self.performance.is_some()
    }

    /// The most relevant human-readable message carried by the item.
    pub fn message(&self) -> Option<&str> {
        self.misconception
            .as_ref()
            .or(self.hint.as_ref())
            .map(|p| p.message.as_str())
            .or(self.mistake.as_deref())
    }

    /// Source line referenced by the item, if any.
    pub fn line(&self) -> Option<usize> {
        self.misconception
            .as_ref()
            .or(self.hint.as_ref())
            .and_then(|p| p.line)
    }
}

/// Summary statistics over a feedback sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    /// Total number of items.
    pub total: usize,
    /// Number of success markers.
    pub successes: usize,
    /// Sum of all partial credit recorded.
    pub partial_credit: f64,
    pub by_label: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
}

impl FeedbackSummary {
    /// Creates a summary from a list of items.
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a FeedbackItem>) -> Self {
        let mut summary = Self::default();

        for item in items {
            summary.total += 1;

            if item.result == Some(true) {
                summary.successes += 1;
            }
            if let Some(value) = item.performance {
                summary.partial_credit += value;
            }

            *summary.by_label.entry(item.label.clone()).or_insert(0) += 1;
            if let Some(ref category) = item.category {
                *summary.by_category.entry(category.clone()).or_insert(0) += 1;
            }
            if let Some(ref priority) = item.priority {
                *summary.by_priority.entry(priority.to_string()).or_insert(0) += 1;
            }
        }

        summary
    }
}
