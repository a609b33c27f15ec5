//! Harness runner: wires a world into the configured engine and packages the
//! outcome as a [`RunReportV1`].
//!
//! # Pipeline
//!
//! ```text
//! RunConfigV1::validate()
//!   → evaluators: h (world heuristic), g, f = g + w·h
//!   → engine (best_first | focal | iterative_deepening)
//!   → search_for_plan(initial)
//!   → RunReportV1 (plan rendered through the world)
//! ```
//!
//! Ordering chains:
//!
//! - best-first: `f` lower, then `g` higher
//! - focal: primary `f` lower then `g` higher, secondary `h`
//! - iterative deepening: `f`

use std::time::Instant;

use thiserror::Error;
use tracing::info;

use wayfinder_search::engine::{EngineStatus, Plan, SearchAlgorithm, SearchStatistics};
use wayfinder_search::evaluator::{Evaluator, FCostEvaluator, GCostEvaluator, HeuristicEvaluator};
use wayfinder_search::frontier::Preference;
use wayfinder_search::{BestFirstSearch, FocalSearch, IterativeDeepeningSearch};

use crate::contract::SearchWorld;
use crate::policy::{AlgorithmV1, ConfigError, RunConfigV1};
use crate::report::{RunReportV1, REPORT_SCHEMA_VERSION};

/// Error during a harness run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid run config: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// The engine refused to start. The runner wires every collaborator,
    /// so this indicates a wiring bug.
    #[error("{algorithm} engine not ready")]
    NotReady { algorithm: &'static str },
}

/// Engine-specific results gathered before the engine is dropped.
struct Outcome<A> {
    algorithm: &'static str,
    status: EngineStatus,
    plan: Option<Plan<A>>,
    statistics: SearchStatistics,
    open_high_water: Option<u64>,
    thresholds: Vec<f64>,
    seed: Option<u64>,
}

impl<A: Clone> Outcome<A> {
    fn collect<'a, S: 'a, E>(engine: &E, status: EngineStatus) -> Self
    where
        A: 'a,
        E: SearchAlgorithm<'a, S, A>,
    {
        Self {
            algorithm: engine.name(),
            status,
            plan: engine.incumbent().cloned(),
            statistics: engine.statistics().clone(),
            open_high_water: None,
            thresholds: Vec::new(),
            seed: None,
        }
    }
}

/// Run `config` against `world` from `initial`.
///
/// # Errors
///
/// Returns [`RunError::InvalidConfig`] if the configuration fails
/// validation and [`RunError::NotReady`] if the engine refuses to start.
/// Running out of budget or exhausting the space are report outcomes, not
/// errors.
pub fn run_search<S, A, W>(
    world: &W,
    initial: S,
    config: &RunConfigV1,
) -> Result<RunReportV1, RunError>
where
    S: Clone,
    A: Clone + PartialEq,
    W: SearchWorld<S, A>,
{
    config.validate()?;
    info!(
        world = world.world_id(),
        algorithm = config.algorithm.as_str(),
        weight = config.heuristic_weight,
        "run starting"
    );
    let started = Instant::now();

    let heuristic = HeuristicEvaluator::new(|state: &S| world.heuristic(state));
    let h: &dyn Evaluator<S, A> = &heuristic;
    let g = GCostEvaluator::new();
    let f = FCostEvaluator::weighted(h, config.heuristic_weight);

    let outcome = match config.algorithm {
        AlgorithmV1::BestFirst => {
            let mut engine = BestFirstSearch::<S, A>::new(config.best_first)
                .with_successor_rule(world)
                .with_goal_test(world)
                .with_hasher(world)
                .with_limits(config.limits)
                .with_tie_breaker(&f, Preference::Lower)
                .with_tie_breaker(&g, Preference::Higher);
            let status = engine.search_for_plan(initial);
            let mut outcome = Outcome::collect::<S, _>(&engine, status);
            outcome.open_high_water = u64::try_from(engine.open().high_water()).ok();
            outcome
        }
        AlgorithmV1::Focal => {
            let mut engine = FocalSearch::<S, A>::new(config.focal)
                .with_successor_rule(world)
                .with_goal_test(world)
                .with_hasher(world)
                .with_limits(config.limits)
                .with_primary(&f, Preference::Lower)
                .with_primary(&g, Preference::Higher)
                .with_secondary(h);
            let status = engine.search_for_plan(initial);
            let mut outcome = Outcome::collect::<S, _>(&engine, status);
            outcome.open_high_water = u64::try_from(engine.open().high_water()).ok();
            outcome
        }
        AlgorithmV1::IterativeDeepening => {
            let mut engine =
                IterativeDeepeningSearch::<S, A>::new(config.iterative_deepening)
                    .with_successor_rule(world)
                    .with_goal_test(world)
                    .with_limits(config.limits)
                    .with_evaluator(&f);
            let status = engine.search_for_plan(initial);
            let mut outcome = Outcome::collect::<S, _>(&engine, status);
            outcome.thresholds = engine
                .iteration_thresholds()
                .iter()
                .copied()
                .filter(|t| t.is_finite())
                .collect();
            if config.iterative_deepening.shuffle_actions {
                outcome.seed = engine.last_seed();
            }
            outcome
        }
    };

    if outcome.status == EngineStatus::NotReady {
        return Err(RunError::NotReady {
            algorithm: outcome.algorithm,
        });
    }

    let wall_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    let report = RunReportV1 {
        schema_version: REPORT_SCHEMA_VERSION.into(),
        world_id: world.world_id().to_owned(),
        algorithm: outcome.algorithm.to_owned(),
        config: config.clone(),
        status: outcome.status,
        solved: outcome.plan.is_some(),
        plan: outcome
            .plan
            .as_ref()
            .map(|p| p.actions.iter().map(|a| world.describe_action(a)).collect())
            .unwrap_or_default(),
        plan_cost: outcome.plan.as_ref().map(|p| p.cost),
        statistics: outcome.statistics,
        open_high_water: outcome.open_high_water,
        thresholds: outcome.thresholds,
        seed: outcome.seed,
        wall_time_us,
    };
    info!(
        world = report.world_id.as_str(),
        algorithm = report.algorithm.as_str(),
        status = ?report.status,
        solved = report.solved,
        plan_cost = report.plan_cost,
        "run finished"
    );
    Ok(report)
}
