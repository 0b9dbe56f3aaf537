//! Named-event hook registry.
//!
//! Tools register callbacks against dotted event names such as
//! `"source.next_section"`. Callbacks for one event run in registration
//! order; the same callback may be registered more than once.

use super::Aggregator;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A registered callback. It receives the aggregator that fired the event.
pub type Hook = Rc<dyn Fn(&mut Aggregator) -> anyhow::Result<()>>;

/// Maximum nesting of `execute_hooks` calls before failing.
pub const DEFAULT_MAX_HOOK_DEPTH: usize = 64;

/// Nesting counter for in-flight hook execution.
///
/// A clone starts at zero, since a copied aggregator is not inside any
/// execution.
#[derive(Debug, Default)]
pub struct HookDepth(Rc<Cell<usize>>);

impl Clone for HookDepth {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl HookDepth {
    pub fn get(&self) -> usize {
        self.0.get()
    }

    /// Enter one level. The level is left when the guard drops, also
    /// while unwinding from a panicking callback.
    pub fn enter(&self) -> DepthGuard {
        self.0.set(self.0.get() + 1);
        DepthGuard(Rc::clone(&self.0))
    }
}

/// Leaves one level of hook nesting on drop.
pub struct DepthGuard(Rc<Cell<usize>>);

impl Drop for DepthGuard {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: BTreeMap<String, Vec<Hook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback to the end of an event's list.
    pub fn register(&mut self, event: &str, hook: Hook) {
        self.hooks.entry(event.to_string()).or_default().push(hook);
    }

    /// Snapshot of the callbacks for an event, in registration order.
    pub fn callbacks(&self, event: &str) -> Vec<Hook> {
        self.hooks.get(event).cloned().unwrap_or_default()
    }

    /// Number of callbacks registered for an event.
    pub fn count(&self, event: &str) -> usize {
        self.hooks.get(event).map_or(0, Vec::len)
    }

    pub fn events(&self) -> impl Iterator<Item = &String> {
        self.hooks.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.hooks.iter().map(|(event, hooks)| (event, hooks.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Hook {
        Rc::new(|_: &mut Aggregator| Ok(()))
    }

    #[test]
    fn test_depth_guard_restores_level() {
        let depth = HookDepth::default();
        {
            let _outer = depth.enter();
            let _inner = depth.enter();
            assert_eq!(depth.get(), 2);
        }
        assert_eq!(depth.get(), 0);

        let _held = depth.enter();
        assert_eq!(depth.clone().get(), 0);
    }

    #[test]
    fn test_register_keeps_duplicates() {
        let mut registry = HookRegistry::new();
        let hook = noop();
        registry.register("source.next_section", hook.clone());
        registry.register("source.next_section", hook);

        assert_eq!(registry.count("source.next_section"), 2);
        assert_eq!(registry.callbacks("source.next_section").len(), 2);
    }

    #[test]
    fn test_unknown_event_is_empty() {
        let registry = HookRegistry::new();
        assert_eq!(registry.count("never.registered"), 0);
        assert!(registry.callbacks("never.registered").is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_debug_shows_counts() {
        let mut registry = HookRegistry::new();
        registry.register("a.b", noop());
        assert_eq!(format!("{:?}", registry), r#"{"a.b": 1}"#);
    }
}
