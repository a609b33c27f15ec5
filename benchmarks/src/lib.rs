//! Shared helpers for wayfinder benchmark suites.

use wayfinder_harness::contract::SearchWorld;
use wayfinder_harness::policy::{AlgorithmV1, RunConfigV1};
use wayfinder_harness::report::RunReportV1;
use wayfinder_harness::runner::run_search;
use wayfinder_harness::worlds::sliding_tile::{Move, SlidingTilePuzzle, TileBoard};
use wayfinder_search::engine::{SearchAlgorithm, SearchStatistics};
use wayfinder_search::evaluator::{
    Estimate, Evaluator, FCostEvaluator, GCostEvaluator, HeuristicEvaluator,
};
use wayfinder_search::frontier::Preference;
use wayfinder_search::node::{NodeId, NodeStore};
use wayfinder_search::policy::{BestFirstConfig, FocalConfig, IterativeDeepeningConfig};
use wayfinder_search::{BestFirstSearch, FocalSearch, IterativeDeepeningSearch};

/// A named tile-puzzle instance.
pub struct Regime {
    pub name: &'static str,
    pub puzzle: SlidingTilePuzzle,
    pub start: TileBoard,
}

/// Benchmark instances, easiest first.
///
/// # Panics
///
/// Panics if a board size is unsupported. Benchmark setup failures are fatal.
#[must_use]
pub fn regimes() -> Vec<Regime> {
    let specs: [(&'static str, usize, usize, usize, u64); 3] = [
        ("3x3_short", 3, 3, 20, 1),
        ("3x3_long", 3, 3, 80, 7),
        ("3x4_medium", 3, 4, 36, 3),
    ];
    specs
        .into_iter()
        .map(|(name, rows, cols, steps, seed)| {
            let puzzle = SlidingTilePuzzle::new(rows, cols).expect("supported board");
            let start = puzzle.scramble(steps, seed);
            Regime { name, puzzle, start }
        })
        .collect()
}

/// Run one engine directly (no report, no digest). Returns its statistics.
#[must_use]
pub fn run_engine_only(regime: &Regime, algorithm: AlgorithmV1) -> SearchStatistics {
    let puzzle = &regime.puzzle;
    let heuristic = HeuristicEvaluator::new(|b: &TileBoard| puzzle.heuristic(b));
    let h: &dyn Evaluator<TileBoard, Move> = &heuristic;
    let f = FCostEvaluator::new(h);
    let g = GCostEvaluator::new();
    let start = regime.start.clone();
    match algorithm {
        AlgorithmV1::BestFirst => {
            let mut engine = BestFirstSearch::<TileBoard, Move>::new(BestFirstConfig::default())
                .with_successor_rule(puzzle)
                .with_goal_test(puzzle)
                .with_hasher(puzzle)
                .with_tie_breaker(&f, Preference::Lower)
                .with_tie_breaker(&g, Preference::Higher);
            engine.search_for_plan(start);
            engine.statistics().clone()
        }
        AlgorithmV1::Focal => {
            let config = FocalConfig {
                weight: 1.5,
                reexpand: true,
            };
            let mut engine = FocalSearch::<TileBoard, Move>::new(config)
                .with_successor_rule(puzzle)
                .with_goal_test(puzzle)
                .with_hasher(puzzle)
                .with_primary(&f, Preference::Lower)
                .with_primary(&g, Preference::Higher)
                .with_secondary(h);
            engine.search_for_plan(start);
            engine.statistics().clone()
        }
        AlgorithmV1::IterativeDeepening => {
            let mut engine =
                IterativeDeepeningSearch::<TileBoard, Move>::new(IterativeDeepeningConfig::default())
                    .with_successor_rule(puzzle)
                    .with_goal_test(puzzle)
                    .with_evaluator(&f);
            engine.search_for_plan(start);
            engine.statistics().clone()
        }
    }
}

/// Full harness pipeline: run, build the report, and digest it.
///
/// # Panics
///
/// Panics if the run or digest fails. Benchmark runs are expected to succeed.
#[must_use]
pub fn run_with_report(regime: &Regime, algorithm: AlgorithmV1) -> (RunReportV1, String) {
    let report = run_search::<TileBoard, Move, _>(
        &regime.puzzle,
        regime.start.clone(),
        &RunConfigV1::for_algorithm(algorithm),
    )
    .expect("run_search");
    let digest = report.digest().expect("digest");
    (report, digest)
}

/// A node store with `n` children of one root, states `0..n` shuffled by a
/// fixed multiplicative stride so insertion order is not score order.
#[must_use]
pub fn scattered_store(n: u32) -> NodeStore<u32, ()> {
    let mut nodes = NodeStore::new();
    let root = nodes.add_root(0);
    let stride = 7919_u64;
    let modulus = u64::from(n.max(1));
    for i in 1..u64::from(n) {
        let state = u32::try_from((i * stride) % modulus).unwrap_or(0);
        nodes.add_child(state, root, 0.0, (), 0.0);
    }
    nodes
}

/// Heuristic that scores a `u32` state by its value.
#[must_use]
pub fn value_heuristic() -> HeuristicEvaluator<fn(&u32) -> Estimate> {
    let score: fn(&u32) -> Estimate = |s| Estimate::new(f64::from(*s));
    HeuristicEvaluator::new(score)
}

/// Score every node of `nodes` with `evaluator` in one round.
pub fn score_all(evaluator: &dyn Evaluator<u32, ()>, nodes: &NodeStore<u32, ()>) {
    evaluator.prepare_to_evaluate();
    for i in 0..nodes.len() {
        evaluator.evaluate(NodeId(i), nodes);
    }
}
