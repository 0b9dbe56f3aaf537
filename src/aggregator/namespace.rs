//! Per-tool results namespace.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Mapping from tool name to whatever data that tool wants to share.
///
/// Reading through [`get_or_insert`](Self::get_or_insert) creates an empty
/// object for unseen tools; [`peek`](Self::peek) and
/// [`contains`](Self::contains) never do.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultsNamespace {
    entries: BTreeMap<String, Value>,
}

impl ResultsNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a tool's data, creating an empty object if absent.
    pub fn get_or_insert(&mut self, key: &str) -> &mut Value {
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()))
    }

    /// Get a tool's data without creating it.
    pub fn peek(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Store a tool's data, replacing anything already there.
    pub fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
