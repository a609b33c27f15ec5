//! Search policy types: resource budgets and per-algorithm configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::SearchStatistics;
use crate::error::SearchError;

/// Resource budgets. `None` means unlimited.
///
/// A budget is reached once the matching counter is `>=` the cap. Work that
/// would consume a reached budget is not started: every budget is sampled
/// before each step, and the generation budgets again before each child.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceLimits {
    /// Cap on node evaluation rounds.
    pub max_evaluations: Option<u64>,
    /// Cap on successor-generation calls.
    pub max_successor_calls: Option<u64>,
    /// Cap on goal tests.
    pub max_goal_tests: Option<u64>,
    /// Cap on child states generated.
    pub max_states_generated: Option<u64>,
    /// Wall-clock cap in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl ResourceLimits {
    /// No budgets at all.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Name of the first budget that `stats` (after `elapsed`) has reached.
    #[must_use]
    pub fn exceeded_by(&self, stats: &SearchStatistics, elapsed: Duration) -> Option<&'static str> {
        self.first_reached(stats, elapsed, true)
    }

    /// As [`Self::exceeded_by`], restricted to the budgets that generating
    /// and scoring one more child would consume.
    #[must_use]
    pub fn child_blocked_by(&self, stats: &SearchStatistics, elapsed: Duration) -> Option<&'static str> {
        self.first_reached(stats, elapsed, false)
    }

    fn first_reached(
        &self,
        stats: &SearchStatistics,
        elapsed: Duration,
        whole_step: bool,
    ) -> Option<&'static str> {
        let reached = |cap: Option<u64>, used: u64| cap.is_some_and(|cap| used >= cap);
        if reached(self.max_evaluations, stats.evaluations) {
            return Some("evaluations");
        }
        if whole_step && reached(self.max_successor_calls, stats.successor_calls) {
            return Some("successor_calls");
        }
        if whole_step && reached(self.max_goal_tests, stats.goal_tests) {
            return Some("goal_tests");
        }
        if reached(self.max_states_generated, stats.states_generated) {
            return Some("states_generated");
        }
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if reached(self.time_limit_ms, elapsed_ms) {
            return Some("time");
        }
        None
    }
}

/// Generalized best-first configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BestFirstConfig {
    /// Reinsert closed nodes whose path cost improves.
    pub reexpand: bool,
}

impl Default for BestFirstConfig {
    fn default() -> Self {
        Self { reexpand: true }
    }
}

/// Bounded-suboptimal focal search configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FocalConfig {
    /// Suboptimality bound; focal holds nodes with `f <= weight * f_min`.
    pub weight: f64,
    pub reexpand: bool,
}

impl FocalConfig {
    /// Check the weight is a finite value `>= 1`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidPolicy`] for any other weight.
    pub fn validate(&self) -> Result<(), SearchError> {
        if !self.weight.is_finite() || self.weight < 1.0 {
            return Err(SearchError::InvalidPolicy {
                detail: format!("focal weight must be finite and >= 1, got {}", self.weight),
            });
        }
        Ok(())
    }
}

impl Default for FocalConfig {
    fn default() -> Self {
        Self {
            weight: 1.0,
            reexpand: true,
        }
    }
}

/// Iterative-deepening configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IterativeDeepeningConfig {
    /// Skip the action that undoes the one that produced the current node.
    pub parent_pruning: bool,
    /// Shuffle each candidate list with the engine's seeded generator.
    pub shuffle_actions: bool,
    /// Fixed shuffle seed; `None` draws and records a fresh seed per run.
    pub seed: Option<u64>,
}

impl Default for IterativeDeepeningConfig {
    fn default() -> Self {
        Self {
            parent_pruning: true,
            shuffle_actions: false,
            seed: None,
        }
    }
}
