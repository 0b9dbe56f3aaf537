//! Suppression table: categories and labels hidden from presentation.

use crate::models::GroupId;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Category that `hide_correctness` marks.
pub const CORRECTNESS_CATEGORY: &str = "success";

/// One suppressed label within a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum SuppressedLabel {
    /// The whole category. Serialized as `true`.
    #[default]
    All,
    /// A single lowercase label.
    Label(String),
}

impl SuppressedLabel {
    /// Build a specific label, normalized to lowercase.
    pub fn label(label: &str) -> Self {
        SuppressedLabel::Label(label.to_lowercase())
    }

    fn normalized(self) -> Self {
        match self {
            SuppressedLabel::Label(l) => SuppressedLabel::Label(l.to_lowercase()),
            all => all,
        }
    }
}

impl From<&str> for SuppressedLabel {
    fn from(label: &str) -> Self {
        SuppressedLabel::label(label)
    }
}

impl From<Option<&str>> for SuppressedLabel {
    fn from(label: Option<&str>) -> Self {
        label.map(SuppressedLabel::label).unwrap_or_default()
    }
}

impl Serialize for SuppressedLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SuppressedLabel::All => serializer.serialize_bool(true),
            SuppressedLabel::Label(l) => serializer.serialize_str(l),
        }
    }
}

/// Where a suppression applies.
///
/// Only global suppression is honored; a group scope is accepted and
/// recorded in the logs, then applied globally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SuppressionScope {
    #[default]
    Global,
    Group(GroupId),
}

/// Mapping from lowercase category to its suppressed labels.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SuppressionTable {
    entries: BTreeMap<String, Vec<SuppressedLabel>>,
}

impl SuppressionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a label under a category. Both keys are lowercased.
    pub fn insert(&mut self, category: &str, label: SuppressedLabel) {
        self.entries
            .entry(category.to_lowercase())
            .or_default()
            .push(label.normalized());
    }

    /// Replace a category's entry with an empty label list.
    pub fn mark_empty(&mut self, category: &str) {
        self.entries.insert(category.to_lowercase(), Vec::new());
    }

    /// Labels recorded for a category, if any.
    pub fn labels(&self, category: &str) -> Option<&[SuppressedLabel]> {
        self.entries
            .get(&category.to_lowercase())
            .map(|labels| labels.as_slice())
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.entries.contains_key(&category.to_lowercase())
    }

    /// Whether feedback with this category and label is hidden.
    pub fn is_suppressed(&self, category: &str, label: &str) -> bool {
        let label = label.to_lowercase();
        self.labels(category).is_some_and(|labels| {
            labels.iter().any(|l| match l {
                SuppressedLabel::All => true,
                SuppressedLabel::Label(l) => *l == label,
            })
        })
    }

    /// Whether correctness signals are hidden.
    ///
    /// Only the empty `success` entry left by `mark_empty` counts; an
    /// ordinary label rule under `success` does not.
    pub fn hides_correctness(&self) -> bool {
        self.labels(CORRECTNESS_CATEGORY)
            .is_some_and(|labels| labels.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<SuppressedLabel>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
