//! Node arena: one record per generated state.
//!
//! Nodes live in a contiguous `Vec` and are referenced by dense [`NodeId`]
//! indices. Parent links are plain indices, so the search graph never holds
//! owning back-references.

use std::fmt;

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Arena slot of this node.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A generated state plus the best path information discovered for it.
#[derive(Debug, Clone)]
pub struct SearchNode<S, A> {
    state: S,
    /// Parent node (the node itself for a root).
    parent: NodeId,
    /// The action that produced this node from its parent (`None` for a root).
    last_action: Option<A>,
    last_action_cost: f64,
    /// Cumulative path cost from the root.
    g_value: f64,
}

impl<S, A> SearchNode<S, A> {
    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    #[must_use]
    pub fn parent(&self) -> NodeId {
        self.parent
    }

    #[must_use]
    pub fn last_action(&self) -> Option<&A> {
        self.last_action.as_ref()
    }

    #[must_use]
    pub fn last_action_cost(&self) -> f64 {
        self.last_action_cost
    }

    #[must_use]
    pub fn g_value(&self) -> f64 {
        self.g_value
    }
}

/// Append-only node storage (with a stack-style `pop_back` for depth-first use).
#[derive(Debug, Clone)]
pub struct NodeStore<S, A> {
    nodes: Vec<SearchNode<S, A>>,
}

impl<S, A> NodeStore<S, A> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a root node: its own parent, `g = 0`, no producing action.
    pub fn add_root(&mut self, state: S) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SearchNode {
            state,
            parent: id,
            last_action: None,
            last_action_cost: 0.0,
            g_value: 0.0,
        });
        id
    }

    /// Add a child node reached from `parent` by `action`.
    pub fn add_child(
        &mut self,
        state: S,
        parent: NodeId,
        g_value: f64,
        action: A,
        action_cost: f64,
    ) -> NodeId {
        debug_assert!(parent.index() < self.nodes.len(), "unknown parent {parent}");
        let id = NodeId(self.nodes.len());
        self.nodes.push(SearchNode {
            state,
            parent,
            last_action: Some(action),
            last_action_cost: action_cost,
            g_value,
        });
        id
    }

    /// Remove the most recently added node.
    ///
    /// Only valid for stack-disciplined use: the removed node must not be
    /// referenced by any remaining node or external structure.
    pub fn pop_back(&mut self) -> Option<SearchNode<S, A>> {
        debug_assert!(!self.nodes.is_empty(), "pop_back on an empty node store");
        self.nodes.pop()
    }

    /// Rewrite a node's path fields after a cheaper path was found.
    pub fn update_path(
        &mut self,
        id: NodeId,
        parent: NodeId,
        g_value: f64,
        action: A,
        action_cost: f64,
    ) {
        let node = &mut self.nodes[id.index()];
        node.parent = parent;
        node.g_value = g_value;
        node.last_action = Some(action);
        node.last_action_cost = action_cost;
    }

    pub fn set_g_value(&mut self, id: NodeId, g_value: f64) {
        self.nodes[id.index()].g_value = g_value;
    }

    pub fn set_parent(&mut self, id: NodeId, parent: NodeId) {
        self.nodes[id.index()].parent = parent;
    }

    pub fn set_last_action(&mut self, id: NodeId, action: Option<A>) {
        self.nodes[id.index()].last_action = action;
    }

    pub fn set_last_action_cost(&mut self, id: NodeId, cost: f64) {
        self.nodes[id.index()].last_action_cost = cost;
    }

    /// Borrow a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was never issued by this store (or has been popped).
    #[must_use]
    pub fn get(&self, id: NodeId) -> &SearchNode<S, A> {
        &self.nodes[id.index()]
    }

    #[must_use]
    pub fn state(&self, id: NodeId) -> &S {
        &self.nodes[id.index()].state
    }

    #[must_use]
    pub fn g_value(&self, id: NodeId) -> f64 {
        self.nodes[id.index()].g_value
    }

    /// Whether `id` is a root (its own parent).
    #[must_use]
    pub fn is_root(&self, id: NodeId) -> bool {
        self.nodes[id.index()].parent == id
    }

    /// Most recently added node, if any.
    #[must_use]
    pub fn last_id(&self) -> Option<NodeId> {
        self.nodes.len().checked_sub(1).map(NodeId)
    }

    /// Node ids from the root to `id`, inclusive, following parent links.
    #[must_use]
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while !self.is_root(current) {
            current = self.nodes[current.index()].parent;
            path.push(current);
            debug_assert!(path.len() <= self.nodes.len(), "parent cycle at {id}");
        }
        path.reverse();
        path
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl<S, A> Default for NodeStore<S, A> {
    fn default() -> Self {
        Self::new()
    }
}
