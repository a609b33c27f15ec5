//! Bounded-suboptimal focal search.
//!
//! Every open node lives in exactly one of two partitions: *focal*, holding
//! the nodes whose primary score is within `weight * f_min`, and *rest*,
//! holding the others. Expansion picks the focal node preferred by a
//! secondary evaluator, so the returned plan costs at most `weight` times
//! the optimum when the primary score is an admissible `f`.

use tracing::{debug, trace};

use crate::best_first::{reconcile_successor, Reconciled};
use crate::contract::{GoalTest, StateHasher, SuccessorRule};
use crate::dedup::DuplicateIndex;
use crate::engine::{SearchAlgorithm, SearchCore, StepOutcome};
use crate::evaluator::Evaluator;
use crate::frontier::{OpenList, Preference, TieBreaker};
use crate::node::{NodeId, NodeStore};
use crate::policy::{FocalConfig, ResourceLimits};

/// Focal search over a borrowed domain.
pub struct FocalSearch<'a, S, A> {
    core: SearchCore<'a, S, A>,
    nodes: NodeStore<S, A>,
    /// Every open node, ordered by the primary chain.
    open: OpenList<'a, S, A>,
    /// Within-bound nodes, ordered by the secondary evaluator then the
    /// primary chain. Rebuilt on each `start`.
    focal: OpenList<'a, S, A>,
    /// Open nodes outside the bound, ordered by the primary chain.
    rest: OpenList<'a, S, A>,
    index: DuplicateIndex,
    hasher: Option<&'a dyn StateHasher<S>>,
    secondary: Option<&'a dyn Evaluator<S, A>>,
    config: FocalConfig,
    last_bound: f64,
}

impl<'a, S, A> FocalSearch<'a, S, A> {
    #[must_use]
    pub fn new(config: FocalConfig) -> Self {
        debug_assert!(config.validate().is_ok(), "focal weight below 1: {}", config.weight);
        Self {
            core: SearchCore::new(),
            nodes: NodeStore::new(),
            open: OpenList::new(Vec::new()),
            focal: OpenList::new(Vec::new()),
            rest: OpenList::new(Vec::new()),
            index: DuplicateIndex::new(),
            hasher: None,
            secondary: None,
            config,
            last_bound: f64::INFINITY,
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

    /// Append a link to the primary chain. The first link supplies the
    /// bounded score and must prefer lower values.
    #[must_use]
    pub fn with_primary(mut self, evaluator: &'a dyn Evaluator<S, A>, preference: Preference) -> Self {
        debug_assert!(
            !self.open.chain().is_empty() || preference == Preference::Lower,
            "the bounded primary score must prefer lower values"
        );
        let link = TieBreaker::new(evaluator, preference);
        self.open.add_tie_breaker(link);
        self.rest.add_tie_breaker(link);
        self.core.register_evaluator(evaluator);
        self
    }

    /// Set the evaluator that orders the focal partition (lower is better).
    #[must_use]
    pub fn with_secondary(mut self, evaluator: &'a dyn Evaluator<S, A>) -> Self {
        self.secondary = Some(evaluator);
        self.core.register_evaluator(evaluator);
        self
    }

    #[must_use]
    pub fn config(&self) -> &FocalConfig {
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

    #[must_use]
    pub fn focal_len(&self) -> usize {
        self.focal.len()
    }

    #[must_use]
    pub fn rest_len(&self) -> usize {
        self.rest.len()
    }

    /// Bound used by the most recent selection.
    #[must_use]
    pub fn last_bound(&self) -> f64 {
        self.last_bound
    }

    /// Every open node is in exactly one partition.
    #[must_use]
    pub fn partition_holds(&self) -> bool {
        self.open.len() == self.focal.len() + self.rest.len()
            && self
                .open
                .iter()
                .all(|id| self.focal.contains(id) != self.rest.contains(id))
    }

    /// Every focal node's primary score is within the last bound.
    #[must_use]
    pub fn focal_within_bound(&self) -> bool {
        let Some(primary) = self.primary() else {
            return self.focal.is_empty();
        };
        self.focal
            .iter()
            .all(|id| primary.cached_eval(id) <= self.last_bound)
    }

    fn primary(&self) -> Option<&'a dyn Evaluator<S, A>> {
        self.open.chain().first().map(|link| link.evaluator)
    }

    /// Migrate nodes between partitions for a new bound.
    fn refresh_focal(&mut self, bound: f64) {
        let Some(primary) = self.primary() else {
            return;
        };
        if bound < self.last_bound {
            let leaving: Vec<NodeId> = self
                .focal
                .iter()
                .filter(|&id| primary.cached_eval(id) > bound)
                .collect();
            for id in leaving {
                self.focal.remove(id);
                self.rest.add_to_open(id);
            }
        }
        while let Some(id) = self.rest.best() {
            if primary.cached_eval(id) > bound {
                break;
            }
            self.rest.remove(id);
            self.focal.add_to_open(id);
        }
        if self.focal.is_empty() {
            if let Some(best) = self.open.best() {
                self.rest.remove(best);
                self.focal.add_to_open(best);
            }
        }
        self.last_bound = bound;
    }

    fn admit(&mut self, id: NodeId) {
        self.core.evaluate_node(id, &self.nodes);
        if self.core.is_dead_end(id) {
            trace!(node = %id, "dead end discarded");
            self.core.note_dead_end();
            return;
        }
        self.open.add_to_open(id);
        self.rest.add_to_open(id);
    }

    fn readmit(&mut self, id: NodeId) {
        self.core.re_evaluate_node(id, &self.nodes);
        if self.open.contains(id) {
            self.open.eval_changed(id);
            if self.focal.contains(id) {
                self.focal.eval_changed(id);
            } else {
                self.rest.eval_changed(id);
            }
        } else if self.config.reexpand && !self.core.is_dead_end(id) {
            trace!(node = %id, g = self.nodes.g_value(id), "reopening");
            self.core.note_reopened();
            self.open.add_to_open(id);
            self.rest.add_to_open(id);
        }
    }
}

impl<'a, S, A> SearchAlgorithm<'a, S, A> for FocalSearch<'a, S, A>
where
    S: Clone,
    A: Clone,
{
    fn name(&self) -> &'static str {
        "focal"
    }

    fn core(&self) -> &SearchCore<'a, S, A> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SearchCore<'a, S, A> {
        &mut self.core
    }

    fn collaborators_ready(&self) -> bool {
        self.hasher.is_some() && self.secondary.is_some() && !self.open.chain().is_empty()
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.open.clear();
        self.focal.clear();
        self.rest.clear();
        self.index.clear();
        self.last_bound = f64::INFINITY;
    }

    fn start(&mut self, initial: S) -> StepOutcome {
        let (Some(hasher), Some(secondary)) = (self.hasher, self.secondary) else {
            return StepOutcome::Completed;
        };
        debug_assert!(hasher.is_perfect(), "duplicate detection needs a perfect hash");
        debug_assert!(self.config.validate().is_ok(), "focal weight below 1");
        let mut chain = vec![TieBreaker::new(secondary, Preference::Lower)];
        chain.extend_from_slice(self.open.chain());
        self.focal = OpenList::new(chain);

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
        let (Some(hasher), Some(primary)) = (self.hasher, self.primary()) else {
            return StepOutcome::Completed;
        };
        let Some(best) = self.open.best() else {
            debug!(nodes = self.nodes.len(), "open list exhausted");
            return StepOutcome::Completed;
        };
        let bound = self.config.weight * primary.cached_eval(best);
        self.refresh_focal(bound);
        let Some(current) = self.focal.pop_best() else {
            return StepOutcome::Completed;
        };
        self.open.remove(current);

        let state = self.nodes.state(current).clone();
        if self.core.is_goal(&state) {
            self.core.record_incumbent(&self.nodes, current);
            return StepOutcome::Completed;
        }
        trace!(node = %current, bound, focal = self.focal.len(), "expanding");
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
