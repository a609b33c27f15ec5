//! Indexed binary-heap open list with a pluggable comparator chain.
//!
//! The heap stores [`NodeId`]s; a side table maps each id to its heap slot so
//! arbitrary nodes can be removed or repositioned in O(log n). Ordering comes
//! from a chain of [`TieBreaker`]s read from evaluator caches: the first
//! evaluator whose scores differ decides, and full ties are left unordered.

use std::cmp::Ordering;

use crate::evaluator::Evaluator;
use crate::node::NodeId;

/// Side-table sentinel for ids not in the heap.
const ABSENT: usize = usize::MAX;

/// Which end of an evaluator's scale is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    Lower,
    Higher,
}

/// One link of the comparator chain.
pub struct TieBreaker<'e, S, A> {
    pub evaluator: &'e dyn Evaluator<S, A>,
    pub preference: Preference,
}

impl<'e, S, A> TieBreaker<'e, S, A> {
    #[must_use]
    pub fn new(evaluator: &'e dyn Evaluator<S, A>, preference: Preference) -> Self {
        Self {
            evaluator,
            preference,
        }
    }

    /// `Less` when `a` is the better node under this link alone.
    fn compare(&self, a: NodeId, b: NodeId) -> Ordering {
        let x = self.evaluator.cached_eval(a);
        let y = self.evaluator.cached_eval(b);
        let ord = match self.preference {
            Preference::Lower => x.partial_cmp(&y),
            Preference::Higher => y.partial_cmp(&x),
        };
        ord.unwrap_or(Ordering::Equal)
    }
}

impl<S, A> Clone for TieBreaker<'_, S, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, A> Copy for TieBreaker<'_, S, A> {}

/// Best-first open list.
pub struct OpenList<'e, S, A> {
    heap: Vec<NodeId>,
    positions: Vec<usize>,
    chain: Vec<TieBreaker<'e, S, A>>,
    high_water: usize,
}

impl<'e, S, A> OpenList<'e, S, A> {
    /// Create an empty open list ordered by `chain`.
    #[must_use]
    pub fn new(chain: Vec<TieBreaker<'e, S, A>>) -> Self {
        Self {
            heap: Vec::new(),
            positions: Vec::new(),
            chain,
            high_water: 0,
        }
    }

    /// Append a link to the end of the comparator chain.
    pub fn add_tie_breaker(&mut self, link: TieBreaker<'e, S, A>) {
        debug_assert!(self.heap.is_empty(), "comparator changed while nodes are open");
        self.chain.push(link);
    }

    /// The comparator chain, best-deciding link first.
    #[must_use]
    pub fn chain(&self) -> &[TieBreaker<'e, S, A>] {
        &self.chain
    }

    /// Compare two nodes under the full chain (`Less` = `a` is better).
    #[must_use]
    pub fn compare(&self, a: NodeId, b: NodeId) -> Ordering {
        self.chain
            .iter()
            .map(|link| link.compare(a, b))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// Insert a node not currently in the list.
    pub fn add_to_open(&mut self, id: NodeId) {
        debug_assert!(!self.chain.is_empty(), "open list has no tie-breakers");
        debug_assert!(!self.contains(id), "{id} is already open");
        if self.positions.len() <= id.index() {
            self.positions.resize(id.index() + 1, ABSENT);
        }
        self.heap.push(id);
        let pos = self.heap.len() - 1;
        self.positions[id.index()] = pos;
        self.sift_up(pos);
        self.high_water = self.high_water.max(self.heap.len());
    }

    /// Peek at the best node.
    #[must_use]
    pub fn best(&self) -> Option<NodeId> {
        self.heap.first().copied()
    }

    /// Remove and return the best node.
    pub fn pop_best(&mut self) -> Option<NodeId> {
        let best = self.best()?;
        self.remove_at(0);
        Some(best)
    }

    /// Remove an arbitrary node. Returns `false` if it was not open.
    pub fn remove(&mut self, id: NodeId) -> bool {
        match self.position(id) {
            Some(pos) => {
                self.remove_at(pos);
                true
            }
            None => false,
        }
    }

    /// Restore heap order after `id`'s cached scores changed.
    pub fn eval_changed(&mut self, id: NodeId) {
        debug_assert!(self.contains(id), "eval_changed on {id}, which is not open");
        let Some(pos) = self.position(id) else {
            return;
        };
        if self.sift_up(pos) == pos {
            self.sift_down(pos);
        }
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.position(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Largest size reached since creation or the last [`OpenList::clear`].
    #[must_use]
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Open ids in heap order (not sorted).
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.heap.iter().copied()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.positions.clear();
        self.high_water = 0;
    }

    /// Check the heap property and side-table agreement.
    ///
    /// Linear time; meant for tests and debug assertions.
    #[must_use]
    pub fn heap_invariant_holds(&self) -> bool {
        let ordered = (1..self.heap.len())
            .all(|i| self.compare(self.heap[i], self.heap[(i - 1) / 2]) != Ordering::Less);
        let indexed = self
            .heap
            .iter()
            .enumerate()
            .all(|(pos, id)| self.positions.get(id.index()) == Some(&pos));
        let counted = self.positions.iter().filter(|&&p| p != ABSENT).count() == self.heap.len();
        ordered && indexed && counted
    }

    fn position(&self, id: NodeId) -> Option<usize> {
        self.positions
            .get(id.index())
            .copied()
            .filter(|&pos| pos != ABSENT)
    }

    fn remove_at(&mut self, pos: usize) {
        let removed = self.heap.swap_remove(pos);
        self.positions[removed.index()] = ABSENT;
        if pos < self.heap.len() {
            let moved = self.heap[pos];
            self.positions[moved.index()] = pos;
            if self.sift_up(pos) == pos {
                self.sift_down(pos);
            }
        }
    }

    fn better(&self, a: usize, b: usize) -> bool {
        self.compare(self.heap[a], self.heap[b]) == Ordering::Less
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a].index()] = a;
        self.positions[self.heap[b].index()] = b;
    }

    /// Move the entry at `pos` towards the root; returns its final slot.
    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.better(pos, parent) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut best = pos;
            if left < self.heap.len() && self.better(left, best) {
                best = left;
            }
            if right < self.heap.len() && self.better(right, best) {
                best = right;
            }
            if best == pos {
                break;
            }
            self.swap(pos, best);
            pos = best;
        }
    }
}
