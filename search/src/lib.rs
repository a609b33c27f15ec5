//! Wayfinder Search: generic heuristic state-space search.
//!
//! Domains plug in through small traits ([`SuccessorRule`], [`GoalTest`],
//! [`StateHasher`]); guidance plugs in through [`Evaluator`]s. Three
//! algorithms share one engine state machine:
//!
//! - [`BestFirstSearch`]: generalized best-first with optional re-expansion
//! - [`FocalSearch`]: bounded-suboptimal search over a focal partition
//! - [`IterativeDeepeningSearch`]: depth-first iterative deepening
//!
//! # Crate dependency graph
//!
//! ```text
//! wayfinder_search  ←  wayfinder_harness
//! (engines, nodes)     (worlds, runner, reports)
//! ```

#![forbid(unsafe_code)]

pub mod best_first;
pub mod contract;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod focal;
pub mod frontier;
pub mod iterative_deepening;
pub mod node;
pub mod policy;

pub use best_first::BestFirstSearch;
pub use contract::{GoalTest, StateHasher, SuccessorRule};
pub use engine::{EngineStatus, Plan, SearchAlgorithm, SearchStatistics};
pub use evaluator::{Estimate, Evaluator, FCostEvaluator, GCostEvaluator, Heuristic, HeuristicEvaluator};
pub use focal::FocalSearch;
pub use frontier::{OpenList, Preference, TieBreaker};
pub use iterative_deepening::IterativeDeepeningSearch;
pub use node::{NodeId, NodeStore};
pub use policy::{BestFirstConfig, FocalConfig, IterativeDeepeningConfig, ResourceLimits};
