//! The feedback aggregator.
//!
//! One [`Aggregator`] holds all mutable state of a single analysis run:
//! the emitted feedback, the suppression table, the current group, the
//! per-tool namespace and the hook registry. Every operation is synchronous
//! and runs on the caller's thread.

pub mod groups;
pub mod hooks;
pub mod namespace;
pub mod suppression;

pub use groups::{GroupContext, GroupOrder};
pub use hooks::{Hook, HookDepth, HookRegistry, DEFAULT_MAX_HOOK_DEPTH};
pub use namespace::ResultsNamespace;
pub use suppression::{SuppressedLabel, SuppressionScope, SuppressionTable, CORRECTNESS_CATEGORY};

use crate::error::FeedbackError;
use crate::models::{FeedbackFields, FeedbackItem, FeedbackSummary, GroupId, Payload, Priority};
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// A message emitted through `explain`, `gently`, `guidance` or `compliment`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Remark {
    pub message: String,
    pub line: Option<usize>,
    /// Overrides the current group.
    pub group: Option<GroupId>,
    /// Overrides the default label of the emitting operation.
    pub label: Option<String>,
}

impl Remark {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn in_group(mut self, group: impl Into<GroupId>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    fn payload(&self) -> Payload {
        Payload::new(self.message.clone(), self.line)
    }
}

impl From<&str> for Remark {
    fn from(message: &str) -> Self {
        Remark::new(message)
    }
}

impl From<String> for Remark {
    fn from(message: String) -> Self {
        Remark::new(message)
    }
}

/// Process-wide feedback state for one analysis run.
#[derive(Debug, Clone)]
pub struct Aggregator {
    feedback: Vec<FeedbackItem>,
    suppressions: SuppressionTable,
    namespace: ResultsNamespace,
    groups: GroupContext,
    hooks: HookRegistry,
    max_hook_depth: Option<usize>,
    hook_depth: HookDepth,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Create a fresh aggregator.
    pub fn new() -> Self {
        Self {
            feedback: Vec::new(),
            suppressions: SuppressionTable::new(),
            namespace: ResultsNamespace::new(),
            groups: GroupContext::default(),
            hooks: HookRegistry::new(),
            max_hook_depth: Some(DEFAULT_MAX_HOOK_DEPTH),
            hook_depth: HookDepth::default(),
        }
    }

    /// Reset all run state back to a fresh aggregator.
    ///
    /// The hook depth limit is configuration and survives the reset.
    pub fn clear(&mut self) {
        self.feedback.clear();
        self.suppressions = SuppressionTable::new();
        self.namespace = ResultsNamespace::new();
        self.groups = GroupContext::default();
        self.hooks = HookRegistry::new();
    }

    /// Whether nothing has been recorded since construction or `clear`.
    pub fn is_fresh(&self) -> bool {
        self.feedback.is_empty()
            && self.suppressions.is_empty()
            && self.namespace.is_empty()
            && self.groups.is_empty()
            && self.hooks.is_empty()
    }

    // === Feedback emission ===

    /// Record that the whole task is complete.
    pub fn set_success(&mut self) {
        self.push_success(None);
    }

    /// Record success in a specific group.
    pub fn set_success_in(&mut self, group: impl Into<GroupId>) {
        self.push_success(Some(group.into()));
    }

    fn push_success(&mut self, group: Option<GroupId>) {
        let mut fields = FeedbackFields::new()
            .with_priority(Priority::Positive)
            .with_result(true);
        fields.group = group;
        self.attach("set_success", fields);
    }

    /// Record partial credit.
    ///
    /// Returns `false` without recording anything when `value` is `None`.
    pub fn give_partial(&mut self, value: Option<f64>, message: Option<&str>) -> bool {
        self.push_partial(value, message, None)
    }

    /// Record partial credit in a specific group.
    pub fn give_partial_in(
        &mut self,
        value: Option<f64>,
        message: Option<&str>,
        group: impl Into<GroupId>,
    ) -> bool {
        self.push_partial(value, message, Some(group.into()))
    }

    fn push_partial(
        &mut self,
        value: Option<f64>,
        message: Option<&str>,
        group: Option<GroupId>,
    ) -> bool {
        let Some(value) = value else {
            debug!("No partial credit recorded: value is absent");
            return false;
        };

        let mut fields = FeedbackFields::new()
            .with_priority(Priority::Positive)
            .with_performance(value);
        fields.mistake = message.map(str::to_string);
        fields.group = group;
        self.attach("give_partial", fields);
        true
    }

    /// Append a feedback item with arbitrary fields.
    ///
    /// The item's group is the one in `fields`, or the current group.
    pub fn attach(&mut self, label: &str, mut fields: FeedbackFields) {
        let group = self.groups.resolve(fields.group.take());
        debug!(label, group = ?group, "Feedback attached");
        self.feedback.push(FeedbackItem::from_fields(label, fields, group));
    }

    /// Explain a mistake with medium priority.
    pub fn explain(&mut self, remark: impl Into<Remark>) {
        self.explain_with(remark, Priority::Medium);
    }

    /// Explain a mistake with the given priority.
    pub fn explain_with(&mut self, remark: impl Into<Remark>, priority: impl Into<Priority>) {
        let remark = remark.into();
        let mut fields = FeedbackFields::new()
            .with_priority(priority)
            .with_category("instructor")
            .with_misconception(remark.payload());
        fields.group = remark.group;
        self.attach(remark.label.as_deref().unwrap_or("explain"), fields);
    }

    /// Explain with student priority.
    pub fn gently(&mut self, remark: impl Into<Remark>) {
        self.explain_with(remark, Priority::Student);
    }

    /// Give a hint that restates the instructions.
    pub fn guidance(&mut self, remark: impl Into<Remark>) {
        let remark = remark.into();
        let mut fields = FeedbackFields::new()
            .with_priority(Priority::Instructions)
            .with_category("instructions")
            .with_hint(remark.payload());
        fields.group = remark.group;
        self.attach(remark.label.as_deref().unwrap_or("guidance"), fields);
    }

    /// Explain with positive priority.
    pub fn compliment(&mut self, remark: impl Into<Remark>) {
        self.explain_with(remark, Priority::Positive);
    }

    /// Extension point for tool logging. Does not record feedback.
    pub fn log(&self, message: &str) {
        info!("{}", message);
    }

    /// Extension point for tool debugging. Does not record feedback.
    pub fn debug(&self, message: &str) {
        debug!("{}", message);
    }

    // === Suppression ===

    /// Suppress a category, or one label within it, everywhere.
    pub fn suppress(&mut self, category: &str, label: impl Into<SuppressedLabel>) {
        self.suppressions.insert(category, label.into());
    }

    /// Suppress with a scope.
    ///
    /// Only global suppression is supported: a group scope is applied
    /// globally.
    pub fn suppress_scoped(
        &mut self,
        category: &str,
        label: impl Into<SuppressedLabel>,
        scope: SuppressionScope,
    ) {
        if let SuppressionScope::Group(ref group) = scope {
            warn!(
                category,
                group = %group,
                "Scoped suppression is not supported; suppressing globally"
            );
        }
        self.suppress(category, label);
    }

    /// Hide correctness signals (success markers and partial credit).
    pub fn hide_correctness(&mut self) {
        self.suppressions.mark_empty(CORRECTNESS_CATEGORY);
    }

    // === Hooks ===

    /// Register a callback for an event. Duplicates are kept.
    pub fn add_hook(
        &mut self,
        event: &str,
        callback: impl Fn(&mut Aggregator) -> anyhow::Result<()> + 'static,
    ) {
        self.add_shared_hook(event, Rc::new(callback));
    }

    /// Register an already shared callback.
    pub fn add_shared_hook(&mut self, event: &str, hook: Hook) {
        debug!(event, "Hook registered");
        self.hooks.register(event, hook);
    }

    /// Run an event's callbacks in registration order.
    ///
    /// The first failing callback stops the rest and its error is returned
    /// as is. Callbacks registered while the event runs are not invoked by
    /// this execution.
    pub fn execute_hooks(&mut self, event: &str) -> anyhow::Result<()> {
        let callbacks = self.hooks.callbacks(event);
        if callbacks.is_empty() {
            return Ok(());
        }

        if let Some(max) = self.max_hook_depth {
            let depth = self.hook_depth.get();
            if depth >= max {
                warn!(event, depth, "Hook depth limit reached");
                return Err(FeedbackError::HookDepthExceeded {
                    event: event.to_string(),
                    depth,
                }
                .into());
            }
        }

        debug!(event, count = callbacks.len(), "Executing hooks");
        let _level = self.hook_depth.enter();
        callbacks.iter().try_for_each(|hook| hook(self))
    }

    /// Number of callbacks registered for an event.
    pub fn hook_count(&self, event: &str) -> usize {
        self.hooks.count(event)
    }

    /// Limit nested hook execution; `None` removes the limit.
    pub fn set_max_hook_depth(&mut self, max: Option<usize>) {
        self.max_hook_depth = max;
    }

    pub fn max_hook_depth(&self) -> Option<usize> {
        self.max_hook_depth
    }

    /// Current nesting of `execute_hooks` calls.
    pub fn hook_depth(&self) -> usize {
        self.hook_depth.get()
    }

    // === Per-tool namespace ===

    /// Get a tool's data, creating an empty object if absent.
    pub fn get_or_insert(&mut self, key: &str) -> &mut Value {
        self.namespace.get_or_insert(key)
    }

    /// Get a tool's data without creating it.
    pub fn peek(&self, key: &str) -> Option<&Value> {
        self.namespace.peek(key)
    }

    /// Store a tool's data, replacing any previous value.
    pub fn set(&mut self, key: &str, value: Value) {
        self.namespace.set(key, value);
    }

    /// Whether a tool has data. Never creates an entry.
    pub fn contains(&self, key: &str) -> bool {
        self.namespace.contains(key)
    }

    // === Group context ===

    pub fn group(&self) -> Option<&GroupId> {
        self.groups.current.as_ref()
    }

    /// Change the current group, returning the previous one.
    pub fn set_group(&mut self, group: Option<GroupId>) -> Option<GroupId> {
        std::mem::replace(&mut self.groups.current, group)
    }

    /// Give a group a student-facing display name.
    pub fn name_group(&mut self, group: impl Into<GroupId>, name: &str) {
        self.groups.names.insert(group.into(), name.to_string());
    }

    pub fn group_name(&self, group: &GroupId) -> Option<&str> {
        self.groups.names.get(group).map(String::as_str)
    }

    pub fn group_names(&self) -> &BTreeMap<GroupId, String> {
        &self.groups.names
    }

    pub fn set_group_order(&mut self, order: GroupOrder) {
        self.groups.order = order;
    }

    pub fn group_order(&self) -> &GroupOrder {
        &self.groups.order
    }

    pub fn group_context(&self) -> &GroupContext {
        &self.groups
    }

    // === Read-out ===

    /// All feedback, in emission order.
    pub fn feedback(&self) -> &[FeedbackItem] {
        &self.feedback
    }

    pub fn suppressions(&self) -> &SuppressionTable {
        &self.suppressions
    }

    pub fn namespace(&self) -> &ResultsNamespace {
        &self.namespace
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn summary(&self) -> FeedbackSummary {
        FeedbackSummary::from_items(&self.feedback)
    }
}
