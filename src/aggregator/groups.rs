//! Group context: the current group, display names and ordering policy.

use crate::models::GroupId;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

type Comparator = Rc<dyn Fn(&GroupId, &GroupId) -> Ordering>;

/// How groups are ordered when feedback is presented.
#[derive(Clone, Default)]
pub enum GroupOrder {
    /// The derived ordering of [`GroupId`].
    #[default]
    Natural,
    /// Listed groups first, by position; the rest follow in natural order.
    Explicit(Vec<GroupId>),
    /// A caller-supplied comparison.
    Custom(Comparator),
}

impl GroupOrder {
    /// Order groups by comparison function.
    pub fn by(compare: impl Fn(&GroupId, &GroupId) -> Ordering + 'static) -> Self {
        GroupOrder::Custom(Rc::new(compare))
    }

    /// Order groups by a key function.
    pub fn by_key<K: Ord>(key: impl Fn(&GroupId) -> K + 'static) -> Self {
        GroupOrder::by(move |a, b| key(a).cmp(&key(b)))
    }

    /// Compare two groups under this policy.
    pub fn compare(&self, a: &GroupId, b: &GroupId) -> Ordering {
        match self {
            GroupOrder::Natural => a.cmp(b),
            GroupOrder::Explicit(sequence) => {
                let position = |g: &GroupId| sequence.iter().position(|s| s == g);
                match (position(a), position(b)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => a.cmp(b),
                }
            }
            GroupOrder::Custom(compare) => compare(a, b),
        }
    }

    /// Sort groups in place (stable).
    pub fn sort(&self, groups: &mut [GroupId]) {
        groups.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Debug for GroupOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupOrder::Natural => write!(f, "Natural"),
            GroupOrder::Explicit(sequence) => f.debug_tuple("Explicit").field(sequence).finish(),
            GroupOrder::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Current group, display names and ordering.
#[derive(Debug, Clone, Default)]
pub struct GroupContext {
    pub current: Option<GroupId>,
    pub names: BTreeMap<GroupId, String>,
    pub order: GroupOrder,
}

impl GroupContext {
    /// Use `explicit` if given, otherwise the current group.
    pub fn resolve(&self, explicit: Option<GroupId>) -> Option<GroupId> {
        explicit.or_else(|| self.current.clone())
    }

    /// Display name for a group, falling back to its identifier.
    pub fn display_name(&self, group: &GroupId) -> String {
        self.names
            .get(group)
            .cloned()
            .unwrap_or_else(|| group.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.names.is_empty() && matches!(self.order, GroupOrder::Natural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<GroupId> {
        vec![
            GroupId::from("a"),
            GroupId::Index(3),
            GroupId::Index(1),
            GroupId::Index(2),
        ]
    }

    #[test]
    fn test_natural_order() {
        let mut g = groups();
        GroupOrder::Natural.sort(&mut g);
        assert_eq!(
            g,
            vec![GroupId::Index(1), GroupId::Index(2), GroupId::Index(3), GroupId::from("a")]
        );
    }

    #[test]
    fn test_explicit_order_puts_unlisted_last() {
        let mut g = groups();
        GroupOrder::Explicit(vec![GroupId::Index(3), GroupId::Index(1)]).sort(&mut g);
        assert_eq!(
            g,
            vec![GroupId::Index(3), GroupId::Index(1), GroupId::Index(2), GroupId::from("a")]
        );
    }

    #[test]
    fn test_key_order() {
        let mut g = vec![GroupId::from("ccc"), GroupId::from("a"), GroupId::from("bb")];
        GroupOrder::by_key(|g: &GroupId| std::cmp::Reverse(g.to_string().len())).sort(&mut g);
        assert_eq!(
            g,
            vec![GroupId::from("ccc"), GroupId::from("bb"), GroupId::from("a")]
        );
    }

    #[test]
    fn test_resolve_prefers_explicit() {
        let ctx = GroupContext {
            current: Some("g1".into()),
            ..Default::default()
        };
        assert_eq!(ctx.resolve(None), Some("g1".into()));
        assert_eq!(ctx.resolve(Some("g2".into())), Some("g2".into()));
    }

    #[test]
    fn test_display_name_fallback() {
        let mut ctx = GroupContext::default();
        ctx.names.insert(GroupId::Index(1), "Part One".to_string());
        assert_eq!(ctx.display_name(&GroupId::Index(1)), "Part One");
        assert_eq!(ctx.display_name(&GroupId::Index(2)), "2");
    }
}
