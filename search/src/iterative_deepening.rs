//! Iterative-deepening depth-first search over an explicit path stack.
//!
//! The node store holds exactly the current root-to-leaf path. Each
//! expanded path node owns one level of the candidate stack (its action list
//! plus a cursor). An iteration explores every path whose score stays within
//! the threshold; the next threshold is the smallest score that exceeded it.
//!
//! No duplicate detection is performed: the search is a tree search, so
//! memory stays linear in the path length.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{debug, trace};

use crate::contract::{GoalTest, SuccessorRule};
use crate::engine::{SearchAlgorithm, SearchCore, StepOutcome};
use crate::evaluator::Evaluator;
use crate::node::{NodeId, NodeStore};
use crate::policy::{IterativeDeepeningConfig, ResourceLimits};

/// Iterative-deepening search over a borrowed domain.
pub struct IterativeDeepeningSearch<'a, S, A> {
    core: SearchCore<'a, S, A>,
    /// Current path, root first.
    nodes: NodeStore<S, A>,
    /// Candidate actions of each expanded path node.
    action_stack: Vec<Vec<A>>,
    /// Next candidate index per level.
    cursor_stack: Vec<usize>,
    threshold: f64,
    /// Smallest score seen above `threshold` this iteration.
    next_threshold: f64,
    thresholds: Vec<f64>,
    evaluator: Option<&'a dyn Evaluator<S, A>>,
    config: IterativeDeepeningConfig,
    rng: ChaCha20Rng,
    last_seed: Option<u64>,
}

impl<S, A> Default for IterativeDeepeningSearch<'_, S, A> {
    fn default() -> Self {
        Self::new(IterativeDeepeningConfig::default())
    }
}

impl<'a, S, A> IterativeDeepeningSearch<'a, S, A> {
    #[must_use]
    pub fn new(config: IterativeDeepeningConfig) -> Self {
        Self {
            core: SearchCore::new(),
            nodes: NodeStore::new(),
            action_stack: Vec::new(),
            cursor_stack: Vec::new(),
            threshold: 0.0,
            next_threshold: f64::INFINITY,
            thresholds: Vec::new(),
            evaluator: None,
            config,
            rng: ChaCha20Rng::seed_from_u64(config.seed.unwrap_or_default()),
            last_seed: None,
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
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.core.set_limits(limits);
        self
    }

    /// Set the evaluator whose score is compared against the threshold.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: &'a dyn Evaluator<S, A>) -> Self {
        self.evaluator = Some(evaluator);
        self.core.register_evaluator(evaluator);
        self
    }

    pub fn set_config(&mut self, config: IterativeDeepeningConfig) {
        self.config = config;
        self.core.reconfigure();
    }

    #[must_use]
    pub fn config(&self) -> &IterativeDeepeningConfig {
        &self.config
    }

    /// Threshold of every iteration started so far, in order.
    #[must_use]
    pub fn iteration_thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Seed used by the most recent initialization.
    #[must_use]
    pub fn last_seed(&self) -> Option<u64> {
        self.last_seed
    }

    /// Current path length (root included).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    fn score(&self, id: NodeId) -> f64 {
        self.evaluator.map_or(f64::INFINITY, |e| e.cached_eval(id))
    }

    /// Close the current iteration; start the next one if anything was cut.
    fn end_iteration(&mut self) -> StepOutcome {
        self.core.note_iteration();
        if !self.next_threshold.is_finite() {
            debug!(threshold = self.threshold, "search space exhausted");
            return StepOutcome::Completed;
        }
        debug!(
            from = self.threshold,
            to = self.next_threshold,
            iteration = self.thresholds.len(),
            "starting next iteration"
        );
        debug_assert!(self.next_threshold >= self.threshold, "threshold decreased");
        debug_assert_eq!(self.nodes.len(), 1, "path must be back at the root");
        self.threshold = self.next_threshold;
        self.next_threshold = f64::INFINITY;
        self.thresholds.push(self.threshold);
        StepOutcome::Continue
    }

    fn increment_top_cursor(&mut self) {
        if let Some(cursor) = self.cursor_stack.last_mut() {
            *cursor += 1;
        }
    }
}

impl<'a, S, A> IterativeDeepeningSearch<'a, S, A>
where
    S: Clone,
    A: Clone + PartialEq,
{
    /// Whether `candidate` undoes the action that produced the path tip.
    fn undoes_last_action(&self, tip: NodeId, candidate: &A) -> bool {
        if !self.config.parent_pruning || self.nodes.is_root(tip) {
            return false;
        }
        let node = self.nodes.get(tip);
        node.last_action()
            .and_then(|last| self.core.inverse(node.state(), last))
            .is_some_and(|inverse| inverse == *candidate)
    }

    /// Move to the next path node: first candidate of a freshly pushed
    /// level, otherwise backtrack and take the next sibling.
    fn advance(&mut self, pushed: bool) -> StepOutcome {
        if !pushed {
            if self.action_stack.is_empty() {
                return self.end_iteration();
            }
            self.nodes.pop_back();
            self.increment_top_cursor();
        }
        loop {
            let Some(level) = self.action_stack.len().checked_sub(1) else {
                return self.end_iteration();
            };
            let cursor = self.cursor_stack[level];
            if cursor >= self.action_stack[level].len() {
                self.action_stack.pop();
                self.cursor_stack.pop();
                if self.action_stack.is_empty() {
                    return self.end_iteration();
                }
                self.nodes.pop_back();
                self.increment_top_cursor();
                continue;
            }
            let Some(tip) = self.nodes.last_id() else {
                return StepOutcome::Completed;
            };
            let action = self.action_stack[level][cursor].clone();
            if self.undoes_last_action(tip, &action) {
                self.increment_top_cursor();
                continue;
            }
            if self.core.child_limit_reached().is_some() {
                return StepOutcome::LimitHit;
            }
            let state = self.nodes.state(tip).clone();
            let Some((child, cost)) = self.core.generate_child(&state, &action) else {
                return StepOutcome::Completed;
            };
            let g = self.nodes.g_value(tip) + cost;
            let id = self.nodes.add_child(child, tip, g, action, cost);
            self.core.evaluate_node(id, &self.nodes);
            return StepOutcome::Continue;
        }
    }
}

impl<'a, S, A> SearchAlgorithm<'a, S, A> for IterativeDeepeningSearch<'a, S, A>
where
    S: Clone,
    A: Clone + PartialEq,
{
    fn name(&self) -> &'static str {
        "iterative_deepening"
    }

    fn core(&self) -> &SearchCore<'a, S, A> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SearchCore<'a, S, A> {
        &mut self.core
    }

    fn collaborators_ready(&self) -> bool {
        self.evaluator.is_some()
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.action_stack.clear();
        self.cursor_stack.clear();
        self.thresholds.clear();
    }

    fn start(&mut self, initial: S) -> StepOutcome {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        self.rng = ChaCha20Rng::seed_from_u64(seed);
        self.last_seed = Some(seed);

        let root = self.nodes.add_root(initial);
        self.core.evaluate_node(root, &self.nodes);
        self.threshold = self.score(root);
        self.next_threshold = f64::INFINITY;
        self.thresholds.push(self.threshold);
        debug!(threshold = self.threshold, seed, "first iteration");
        StepOutcome::Continue
    }

    fn step(&mut self) -> StepOutcome {
        let Some(tip) = self.nodes.last_id() else {
            return StepOutcome::Completed;
        };
        let mut pushed = false;
        if self.core.is_dead_end(tip) {
            self.core.note_dead_end();
            if self.nodes.is_root(tip) {
                debug!("root is a dead end");
                return StepOutcome::Completed;
            }
        } else {
            let score = self.score(tip);
            if score > self.threshold {
                if score < self.next_threshold {
                    self.next_threshold = score;
                }
            } else {
                let state = self.nodes.state(tip).clone();
                if self.core.is_goal(&state) {
                    self.core.record_incumbent(&self.nodes, tip);
                    return StepOutcome::Completed;
                }
                trace!(node = %tip, depth = self.nodes.len(), score, "expanding");
                let mut actions = self.core.generate_actions(&state);
                if self.config.shuffle_actions {
                    actions.shuffle(&mut self.rng);
                }
                self.action_stack.push(actions);
                self.cursor_stack.push(0);
                pushed = true;
            }
        }
        self.advance(pushed)
    }
}
