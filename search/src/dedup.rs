//! Duplicate-detection index: state hash key → node id.

use std::collections::HashMap;

use crate::node::NodeId;

/// Maps state hash keys to the node that currently represents the state.
///
/// Correctness relies on the hasher being perfect (see
/// [`crate::contract::StateHasher`]); collisions silently merge states.
#[derive(Debug, Clone, Default)]
pub struct DuplicateIndex {
    entries: HashMap<u64, NodeId>,
}

impl DuplicateIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Node previously recorded for `key`, if any.
    #[must_use]
    pub fn find(&self, key: u64) -> Option<NodeId> {
        self.entries.get(&key).copied()
    }

    /// Record `id` as the node for `key`. Returns the previous node, if any.
    pub fn insert(&mut self, key: u64, id: NodeId) -> Option<NodeId> {
        self.entries.insert(key, id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
