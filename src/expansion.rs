//! Which table rows are expanded.

use std::collections::HashSet;
use std::hash::Hash;

/// A set of expanded keys.
#[derive(Debug, Clone)]
pub struct ExpansionSet<K> {
    expanded: HashSet<K>,
}

impl<K> Default for ExpansionSet<K> {
    fn default() -> Self {
        Self {
            expanded: HashSet::new(),
        }
    }
}

impl<K: Eq + Hash> ExpansionSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips `key`; returns whether it is expanded afterwards.
    pub fn toggle(&mut self, key: K) -> bool {
        if self.expanded.remove(&key) {
            false
        } else {
            self.expanded.insert(key);
            true
        }
    }

    pub fn add(&mut self, key: K) {
        self.expanded.insert(key);
    }

    pub fn remove(&mut self, key: &K) {
        self.expanded.remove(key);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.expanded.contains(key)
    }

    pub fn is_expanded(&self, key: &K) -> bool {
        self.contains(key)
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

/// Route tables are keyed by bus number, feedback tables by group name.
#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    pub routes: ExpansionSet<u32>,
    pub feedback_groups: ExpansionSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_membership() {
        let mut set = ExpansionSet::new();
        assert!(set.toggle(3));
        assert!(set.is_expanded(&3));
        assert!(!set.toggle(3));
        assert!(!set.is_expanded(&3));
        assert!(set.is_empty());
    }

    #[test]
    fn test_add_remove_idempotent() {
        let mut set = ExpansionSet::new();
        set.add("Bus 1".to_string());
        set.add("Bus 1".to_string());
        assert_eq!(set.len(), 1);
        set.remove(&"Bus 1".to_string());
        set.remove(&"Bus 1".to_string());
        assert!(!set.contains(&"Bus 1".to_string()));
    }

    #[test]
    fn test_namespaces_are_independent() {
        let mut state = ExpansionState::default();
        state.routes.toggle(1);
        state.feedback_groups.toggle("Bus 1".to_string());
        state.routes.toggle(1);

        assert!(!state.routes.is_expanded(&1));
        assert!(state.feedback_groups.is_expanded(&"Bus 1".to_string()));
    }
}
