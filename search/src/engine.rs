//! Generic engine state machine shared by every search algorithm.
//!
//! [`SearchCore`] owns what all algorithms have in common: the borrowed
//! domain collaborators, the registered evaluators, resource limits,
//! statistics, the incumbent plan, and the lifecycle phase. Algorithms
//! implement [`SearchAlgorithm`] by supplying `clear`, `start` and `step`; the
//! provided methods enforce the lifecycle:
//!
//! ```text
//! not_ready → ready → active → { search_completed, resource_limit_hit }
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::contract::{GoalTest, SuccessorRule};
use crate::evaluator::Evaluator;
use crate::node::{NodeId, NodeStore};
use crate::policy::ResourceLimits;

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    /// A mandatory collaborator is missing.
    NotReady,
    /// Configured; `initialize_search` may be called.
    Ready,
    /// A search is in progress.
    Active,
    /// Goal found, frontier exhausted, or initial state rejected.
    SearchCompleted,
    /// A resource budget was reached. Any incumbent is retained.
    ResourceLimitHit,
}

/// Counters accumulated over one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatistics {
    /// Evaluation rounds (one per evaluated or re-evaluated node).
    pub evaluations: u64,
    pub successor_calls: u64,
    pub goal_tests: u64,
    pub actions_generated: u64,
    pub states_generated: u64,
    /// Closed nodes reinserted after a cheaper path was found.
    pub nodes_reopened: u64,
    pub dead_ends: u64,
    /// Completed iterative-deepening iterations.
    pub iterations: u64,
    /// Wall-clock time since initialization. Not serialized.
    #[serde(skip)]
    pub search_time: Duration,
}

/// A solution: actions from the initial state to a goal, with total cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan<A> {
    pub actions: Vec<A>,
    pub cost: f64,
}

impl<A> Plan<A> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Result of one algorithm step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Keep searching.
    Continue,
    /// Goal found or space exhausted.
    Completed,
    /// A budget was reached mid-step.
    LimitHit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Active,
    Completed,
    LimitHit,
}

/// Shared engine state embedded in every algorithm.
pub struct SearchCore<'a, S, A> {
    successors: Option<&'a dyn SuccessorRule<S, A>>,
    goal_test: Option<&'a dyn GoalTest<S>>,
    evaluators: Vec<&'a dyn Evaluator<S, A>>,
    limits: ResourceLimits,
    stats: SearchStatistics,
    phase: Phase,
    incumbent: Option<Plan<A>>,
    started: Option<Instant>,
}

impl<S, A> Default for SearchCore<'_, S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, S, A> SearchCore<'a, S, A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            successors: None,
            goal_test: None,
            evaluators: Vec::new(),
            limits: ResourceLimits::unlimited(),
            stats: SearchStatistics::default(),
            phase: Phase::Idle,
            incumbent: None,
            started: None,
        }
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    pub fn set_successor_rule(&mut self, rule: &'a dyn SuccessorRule<S, A>) {
        self.successors = Some(rule);
        self.reconfigure();
    }

    pub fn set_goal_test(&mut self, goal_test: &'a dyn GoalTest<S>) {
        self.goal_test = Some(goal_test);
        self.reconfigure();
    }

    pub fn set_limits(&mut self, limits: ResourceLimits) {
        self.limits = limits;
        self.reconfigure();
    }

    #[must_use]
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Add an evaluator to the set prepared and run for every scored node.
    pub fn register_evaluator(&mut self, evaluator: &'a dyn Evaluator<S, A>) {
        self.evaluators.push(evaluator);
        self.reconfigure();
    }

    /// Whether the successor rule and goal test are attached.
    #[must_use]
    pub fn has_domain(&self) -> bool {
        self.successors.is_some() && self.goal_test.is_some()
    }

    /// Current status, given whether the algorithm's own collaborators are
    /// attached.
    #[must_use]
    pub fn status(&self, collaborators_ready: bool) -> EngineStatus {
        match self.phase {
            Phase::Idle if self.has_domain() && collaborators_ready => EngineStatus::Ready,
            Phase::Idle => EngineStatus::NotReady,
            Phase::Active => EngineStatus::Active,
            Phase::Completed => EngineStatus::SearchCompleted,
            Phase::LimitHit => EngineStatus::ResourceLimitHit,
        }
    }

    /// Drop back to the idle phase after a configuration change.
    pub fn reconfigure(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Reset per-run state and enter the active phase.
    pub fn begin(&mut self) {
        self.stats = SearchStatistics::default();
        self.incumbent = None;
        for evaluator in &self.evaluators {
            evaluator.reset();
        }
        self.started = Some(Instant::now());
        self.phase = Phase::Active;
    }

    /// Leave the active phase.
    pub fn finish(&mut self, outcome: StepOutcome) {
        self.touch_clock();
        self.phase = match outcome {
            StepOutcome::Continue => Phase::Active,
            StepOutcome::Completed => Phase::Completed,
            StepOutcome::LimitHit => Phase::LimitHit,
        };
    }

    /// Refresh `search_time` from the run's start instant.
    pub fn touch_clock(&mut self) {
        if let Some(started) = self.started {
            self.stats.search_time = started.elapsed();
        }
    }

    // ---------------------------------------------------------------------
    // Evaluation
    // ---------------------------------------------------------------------

    /// Prepare every registered evaluator, then score `id` with each.
    pub fn evaluate_node(&mut self, id: NodeId, nodes: &NodeStore<S, A>) {
        for evaluator in &self.evaluators {
            evaluator.prepare_to_evaluate();
        }
        for evaluator in &self.evaluators {
            evaluator.evaluate(id, nodes);
        }
        self.stats.evaluations += 1;
    }

    /// As [`Self::evaluate_node`], after `id`'s path fields changed.
    pub fn re_evaluate_node(&mut self, id: NodeId, nodes: &NodeStore<S, A>) {
        for evaluator in &self.evaluators {
            evaluator.prepare_to_evaluate();
        }
        for evaluator in &self.evaluators {
            evaluator.re_evaluate(id, nodes);
        }
        self.stats.evaluations += 1;
    }

    /// Whether any registered evaluator flags `id` as a dead end.
    #[must_use]
    pub fn is_dead_end(&self, id: NodeId) -> bool {
        self.evaluators.iter().any(|e| e.cached_is_dead_end(id))
    }

    // ---------------------------------------------------------------------
    // Domain calls (counted)
    // ---------------------------------------------------------------------

    /// Enumerate the actions applicable in `state`.
    pub fn generate_actions(&mut self, state: &S) -> Vec<A> {
        debug_assert!(self.successors.is_some(), "successor rule missing while active");
        let Some(rule) = self.successors else {
            return Vec::new();
        };
        let actions = rule.actions(state);
        self.stats.successor_calls += 1;
        self.stats.actions_generated += actions.len() as u64;
        actions
    }

    /// Child state reached by `action` from `state`, with the action's cost.
    pub fn generate_child(&mut self, state: &S, action: &A) -> Option<(S, f64)>
    where
        S: Clone,
    {
        let rule = self.successors?;
        debug_assert!(rule.is_applicable(state, action), "inapplicable action generated");
        let cost = rule.action_cost(state, action);
        debug_assert!(cost >= 0.0, "negative action cost {cost}");
        let child = rule.child_state(state, action);
        self.stats.states_generated += 1;
        Some((child, cost))
    }

    /// Inverse of `action` in the state it reached.
    #[must_use]
    pub fn inverse(&self, state: &S, action: &A) -> Option<A> {
        self.successors.and_then(|rule| rule.inverse(state, action))
    }

    pub fn is_goal(&mut self, state: &S) -> bool {
        self.stats.goal_tests += 1;
        self.goal_test.is_some_and(|goal| goal.is_goal(state))
    }

    #[must_use]
    pub fn is_valid_state(&self, state: &S) -> bool {
        self.successors.is_some_and(|rule| rule.is_valid_state(state))
    }

    // ---------------------------------------------------------------------
    // Limits, incumbent, bookkeeping
    // ---------------------------------------------------------------------

    /// Name of the budget that has been reached, if any.
    pub fn limit_reached(&mut self) -> Option<&'static str> {
        self.touch_clock();
        self.limits.exceeded_by(&self.stats, self.stats.search_time)
    }

    /// Name of the budget that blocks generating another child, if any.
    pub fn child_limit_reached(&mut self) -> Option<&'static str> {
        self.touch_clock();
        self.limits.child_blocked_by(&self.stats, self.stats.search_time)
    }

    /// Extract the plan ending at `goal`; keep it if strictly cheaper than
    /// the incumbent. Returns whether the incumbent changed.
    ///
    /// The plan cost is the sum of action costs along the parent chain.
    pub fn record_incumbent(&mut self, nodes: &NodeStore<S, A>, goal: NodeId) -> bool
    where
        A: Clone,
    {
        let path = nodes.path_to(goal);
        let mut actions = Vec::with_capacity(path.len().saturating_sub(1));
        let mut cost = 0.0;
        for &id in path.iter().skip(1) {
            let node = nodes.get(id);
            if let Some(action) = node.last_action() {
                actions.push(action.clone());
            }
            cost += node.last_action_cost();
        }
        if self.incumbent.as_ref().is_some_and(|best| best.cost <= cost) {
            return false;
        }
        info!(cost, length = actions.len(), goal = %goal, "plan found");
        self.incumbent = Some(Plan { actions, cost });
        true
    }

    pub fn note_reopened(&mut self) {
        self.stats.nodes_reopened += 1;
    }

    pub fn note_dead_end(&mut self) {
        self.stats.dead_ends += 1;
    }

    pub fn note_iteration(&mut self) {
        self.stats.iterations += 1;
    }

    #[must_use]
    pub fn stats(&self) -> &SearchStatistics {
        &self.stats
    }

    #[must_use]
    pub fn incumbent(&self) -> Option<&Plan<A>> {
        self.incumbent.as_ref()
    }
}

/// The step contract every algorithm plugs into.
///
/// Implementors provide `clear` (drop the previous run's structures), `start`
/// (seed the search structures with the initial state) and `step` (one unit
/// of work). Status handling, limit checks and the not-ready guard live in
/// the provided methods.
pub trait SearchAlgorithm<'a, S: 'a, A: 'a> {
    /// Short algorithm identifier.
    fn name(&self) -> &'static str;

    fn core(&self) -> &SearchCore<'a, S, A>;

    fn core_mut(&mut self) -> &mut SearchCore<'a, S, A>;

    /// Whether algorithm-specific collaborators (hasher, evaluators) are set.
    fn collaborators_ready(&self) -> bool;

    /// Empty the node store and frontiers left by a previous run.
    fn clear(&mut self);

    /// Insert the initial state into freshly cleared structures.
    fn start(&mut self, initial: S) -> StepOutcome;

    /// Perform one unit of search work.
    fn step(&mut self) -> StepOutcome;

    fn status(&self) -> EngineStatus {
        self.core().status(self.collaborators_ready())
    }

    /// Begin a new search from `initial`.
    ///
    /// Returns `NotReady` with no side effects when a collaborator is missing.
    fn initialize_search(&mut self, initial: S) -> EngineStatus {
        if self.status() == EngineStatus::NotReady {
            debug!(algorithm = self.name(), "initialize refused: not ready");
            return EngineStatus::NotReady;
        }
        self.core_mut().begin();
        self.clear();
        if !self.core().is_valid_state(&initial) {
            warn!(algorithm = self.name(), "initial state rejected as invalid");
            self.core_mut().finish(StepOutcome::Completed);
            return self.status();
        }
        // Evaluating the root already consumes budget.
        if let Some(budget) = self.core_mut().child_limit_reached() {
            info!(algorithm = self.name(), budget, "resource limit hit before the root");
            self.core_mut().finish(StepOutcome::LimitHit);
            return self.status();
        }
        info!(algorithm = self.name(), "search initialized");
        let outcome = self.start(initial);
        if outcome != StepOutcome::Continue {
            self.core_mut().finish(outcome);
        }
        self.status()
    }

    /// Run one step if active. Budgets are checked before the step.
    fn search_step(&mut self) -> EngineStatus {
        let status = self.status();
        if status != EngineStatus::Active {
            return status;
        }
        if let Some(budget) = self.core_mut().limit_reached() {
            info!(algorithm = self.name(), budget, "resource limit hit");
            self.core_mut().finish(StepOutcome::LimitHit);
            return self.status();
        }
        match self.step() {
            StepOutcome::Continue => self.core_mut().touch_clock(),
            StepOutcome::Completed => {
                info!(
                    algorithm = self.name(),
                    solved = self.core().incumbent().is_some(),
                    "search completed"
                );
                self.core_mut().finish(StepOutcome::Completed);
            }
            StepOutcome::LimitHit => {
                info!(algorithm = self.name(), "resource limit hit during step");
                self.core_mut().finish(StepOutcome::LimitHit);
            }
        }
        self.status()
    }

    /// Initialize from `initial` and step until the search leaves `Active`.
    fn search_for_plan(&mut self, initial: S) -> EngineStatus {
        let mut status = self.initialize_search(initial);
        while status == EngineStatus::Active {
            status = self.search_step();
        }
        status
    }

    fn incumbent<'s>(&'s self) -> Option<&'s Plan<A>>
    where
        'a: 's,
    {
        self.core().incumbent()
    }

    fn statistics<'s>(&'s self) -> &'s SearchStatistics
    where
        'a: 's,
    {
        self.core().stats()
    }
}
