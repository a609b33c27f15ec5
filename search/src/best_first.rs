//! Generalized best-first search with optional re-expansion.
//!
//! The open list is ordered by a caller-supplied comparator chain, so the
//! same engine runs A* (`f` lower, `g` higher), weighted A*, greedy search,
//! or uniform-cost search depending on which evaluators are attached.

use tracing::{debug, trace};

use crate::contract::{GoalTest, StateHasher, SuccessorRule};
use crate::dedup::DuplicateIndex;
use crate::engine::{SearchAlgorithm, SearchCore, StepOutcome};
use crate::evaluator::Evaluator;
use crate::frontier::{OpenList, Preference, TieBreaker};
use crate::node::{NodeId, NodeStore};
use crate::policy::{BestFirstConfig, ResourceLimits};

/// What duplicate detection did with a generated child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reconciled {
    /// First time this state was seen; a node was created.
    Created(NodeId),
    /// Known state reached more cheaply; its path fields were rewritten.
    Improved(NodeId),
    /// Known state, no improvement.
    Unchanged,
}

/// Look `child` up in the duplicate index and create or improve its node.
pub(crate) fn reconcile_successor<S, A>(
    nodes: &mut NodeStore<S, A>,
    index: &mut DuplicateIndex,
    hasher: &dyn StateHasher<S>,
    parent: NodeId,
    child: S,
    action: A,
    cost: f64,
) -> Reconciled {
    let g = nodes.g_value(parent) + cost;
    let key = hasher.hash_value(&child);
    match index.find(key) {
        None => {
            let id = nodes.add_child(child, parent, g, action, cost);
            index.insert(key, id);
            Reconciled::Created(id)
        }
        Some(id) if g < nodes.g_value(id) => {
            nodes.update_path(id, parent, g, action, cost);
            Reconciled::Improved(id)
        }
        Some(_) => Reconciled::Unchanged,
    }
}

/// Best-first search over a borrowed domain.
pub struct BestFirstSearch<'a, S, A> {
    core: SearchCore<'a, S, A>,
    nodes: NodeStore<S, A>,
    open: OpenList<'a, S, A>,
    index: DuplicateIndex,
    hasher: Option<&'a dyn StateHasher<S>>,
    config: BestFirstConfig,
}

impl<S, A> Default for BestFirstSearch<'_, S, A> {
    fn default() -> Self {
        Self::new(BestFirstConfig::default())
    }
}

impl<'a, S, A> BestFirstSearch<'a, S, A> {
    #[must_use]
    pub fn new(config: BestFirstConfig) -> Self {
        Self {
            core: SearchCore::new(),
            nodes: NodeStore::new(),
            open: OpenList::new(Vec::new()),
            index: DuplicateIndex::new(),
            hasher: None,
            config,
        }
    }

    #[must_use]
    pub fn with_successor_rule(mut self, rule: &'a dyn SuccessorRule<S, A>) -> Self {
        self.core.set_successor_rule(rule);
        self
    }

    #[must_use]
    pub fn with_goal_test(mut self, goal_test: &'a dyn GoalTest<S>) -> Self {
        self.core.set_goal_test(goal_test);
        self
    }

    #[must_use]
    pub fn with_hasher(mut self, hasher: &'a dyn StateHasher<S>) -> Self {
        self.hasher = Some(hasher);
        self.core.reconfigure();
        self
    }

    #[must_use]
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.core.set_limits(limits);
        self
    }

    /// Append `evaluator` to the comparator chain and register it for scoring.
    #[must_use]
    pub fn with_tie_breaker(
        mut self,
        evaluator: &'a dyn Evaluator<S, A>,
        preference: Preference,
    ) -> Self {
        self.open.add_tie_breaker(TieBreaker::new(evaluator, preference));
        self.core.register_evaluator(evaluator);
        self
    }

    pub fn set_config(&mut self, config: BestFirstConfig) {
        self.config = config;
        self.core.reconfigure();
    }

    #[must_use]
    pub fn config(&self) -> &BestFirstConfig {
        &self.config
    }

    #[must_use]
    pub fn nodes(&self) -> &NodeStore<S, A> {
        &self.nodes
    }

    #[must_use]
    pub fn open(&self) -> &OpenList<'a, S, A> {
        &self.open
    }

    /// Score a freshly created node and open it unless it is a dead end.
    fn admit(&mut self, id: NodeId) {
        self.core.evaluate_node(id, &self.nodes);
        if self.core.is_dead_end(id) {
            trace!(node = %id, "dead end discarded");
            self.core.note_dead_end();
            return;
        }
        self.open.add_to_open(id);
    }

    /// Re-score a node whose path improved; reposition or reopen it.
    fn readmit(&mut self, id: NodeId) {
        self.core.re_evaluate_node(id, &self.nodes);
        if self.open.contains(id) {
            self.open.eval_changed(id);
        } else if self.config.reexpand && !self.core.is_dead_end(id) {
            trace!(node = %id, g = self.nodes.g_value(id), "reopening");
            self.core.note_reopened();
            self.open.add_to_open(id);
        }
    }
}

impl<'a, S, A> SearchAlgorithm<'a, S, A> for BestFirstSearch<'a, S, A>
where
    S: Clone,
    A: Clone,
{
    fn name(&self) -> &'static str {
        "best_first"
    }

    fn core(&self) -> &SearchCore<'a, S, A> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SearchCore<'a, S, A> {
        &mut self.core
    }

    fn collaborators_ready(&self) -> bool {
        self.hasher.is_some() && !self.open.chain().is_empty()
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.open.clear();
        self.index.clear();
    }

    fn start(&mut self, initial: S) -> StepOutcome {
        let Some(hasher) = self.hasher else {
            return StepOutcome::Completed;
        };
        debug_assert!(hasher.is_perfect(), "duplicate detection needs a perfect hash");
        let key = hasher.hash_value(&initial);
        let root = self.nodes.add_root(initial);
        self.index.insert(key, root);
        self.admit(root);
        if self.open.is_empty() {
            debug!("initial state is a dead end");
            return StepOutcome::Completed;
        }
        StepOutcome::Continue
    }

    fn step(&mut self) -> StepOutcome {
        let Some(hasher) = self.hasher else {
            return StepOutcome::Completed;
        };
        let Some(current) = self.open.pop_best() else {
            debug!(nodes = self.nodes.len(), "open list exhausted");
            return StepOutcome::Completed;
        };
        let state = self.nodes.state(current).clone();
        if self.core.is_goal(&state) {
            self.core.record_incumbent(&self.nodes, current);
            return StepOutcome::Completed;
        }
        trace!(node = %current, g = self.nodes.g_value(current), "expanding");
        for action in self.core.generate_actions(&state) {
            if self.core.child_limit_reached().is_some() {
                return StepOutcome::LimitHit;
            }
            let Some((child, cost)) = self.core.generate_child(&state, &action) else {
                return StepOutcome::Completed;
            };
            match reconcile_successor(
                &mut self.nodes,
                &mut self.index,
                hasher,
                current,
                child,
                action,
                cost,
            ) {
                Reconciled::Created(id) => self.admit(id),
                Reconciled::Improved(id) => self.readmit(id),
                Reconciled::Unchanged => {}
            }
        }
        StepOutcome::Continue
    }
}
