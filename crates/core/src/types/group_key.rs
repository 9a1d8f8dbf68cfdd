use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Sortable key that orders extraction backends: the primary group always comes
/// first, other groups sort by label, then by order within a label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    group: String,
    order: i32,
}

impl GroupKey {
    /// Label of the group that sorts ahead of every other group
    pub const PRIMARY_GROUP: &'static str = "primary";

    pub fn new(group: impl Into<String>, order: i32) -> Self {
        Self {
            group: group.into(),
            order,
        }
    }

    pub fn primary(order: i32) -> Self {
        Self::new(Self::PRIMARY_GROUP, order)
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn is_primary(&self) -> bool {
        self.group == Self::PRIMARY_GROUP
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_primary(), other.is_primary()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self
                .group
                .cmp(&other.group)
                .then(self.order.cmp(&other.order)),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_primary_group_sorts_first() {
        let mut keys = BTreeSet::new();
        for (group, order) in [
            ("ant", 1),
            ("bsh", 1),
            ("foo", 1),
            ("zzz", 1),
            ("primary", 1),
            ("aaa", 2),
            ("bbb", 3),
            ("bsh", 100),
            ("ant", 5),
            ("primary", 2),
        ] {
            assert!(keys.insert(GroupKey::new(group, order)));
        }

        let sorted: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(
            sorted,
            vec![
                "primary:1",
                "primary:2",
                "aaa:2",
                "ant:1",
                "ant:5",
                "bbb:3",
                "bsh:1",
                "bsh:100",
                "foo:1",
                "zzz:1",
            ]
        );

        assert!(!keys.insert(GroupKey::primary(1)));
        assert_eq!(keys.len(), 10);
    }

    #[test]
    fn test_order_breaks_ties_within_group() {
        assert!(GroupKey::new("ant", 1) < GroupKey::new("ant", 2));
        assert!(GroupKey::primary(500) < GroupKey::new("aaa", 1));
    }
}
