//! Budget enforcement and lifecycle lock tests: every budget stops every
//! engine at its cap, not-ready engines refuse without side effects, and a
//! stopped engine can be restarted.

use lock_tests::scenarios::{run_tile, tile_instance, ALL_ALGORITHMS, TILE_SEEDS};
use wayfinder_harness::contract::SearchWorld;
use wayfinder_harness::policy::RunConfigV1;
use wayfinder_harness::worlds::sliding_tile::{Move, TileBoard};
use wayfinder_search::engine::{EngineStatus, SearchAlgorithm};
use wayfinder_search::evaluator::{Evaluator, FCostEvaluator, GCostEvaluator, HeuristicEvaluator};
use wayfinder_search::frontier::Preference;
use wayfinder_search::policy::{FocalConfig, IterativeDeepeningConfig, ResourceLimits};
use wayfinder_search::{BestFirstSearch, FocalSearch, IterativeDeepeningSearch};

const SEED: u64 = TILE_SEEDS[1];

fn limited(algorithm: wayfinder_harness::policy::AlgorithmV1, limits: ResourceLimits) -> RunConfigV1 {
    RunConfigV1 {
        limits,
        ..RunConfigV1::for_algorithm(algorithm)
    }
}

// ---------------------------------------------------------------------------
// Budgets
// ---------------------------------------------------------------------------

#[test]
fn successor_call_budget_is_exact() {
    for algorithm in ALL_ALGORITHMS {
        let limits = ResourceLimits {
            max_successor_calls: Some(5),
            ..ResourceLimits::unlimited()
        };
        let report = run_tile(SEED, &limited(algorithm, limits));
        assert_eq!(report.status, EngineStatus::ResourceLimitHit, "{algorithm:?}");
        assert!(!report.solved, "{algorithm:?}");
        assert_eq!(report.statistics.successor_calls, 5, "{algorithm:?}");
    }
}

#[test]
fn states_generated_budget_is_exact() {
    for algorithm in ALL_ALGORITHMS {
        let limits = ResourceLimits {
            max_states_generated: Some(7),
            ..ResourceLimits::unlimited()
        };
        let report = run_tile(SEED, &limited(algorithm, limits));
        assert_eq!(report.status, EngineStatus::ResourceLimitHit, "{algorithm:?}");
        assert_eq!(report.statistics.states_generated, 7, "{algorithm:?}");
    }
}

#[test]
fn goal_test_budget_is_exact() {
    for algorithm in ALL_ALGORITHMS {
        let limits = ResourceLimits {
            max_goal_tests: Some(4),
            ..ResourceLimits::unlimited()
        };
        let report = run_tile(SEED, &limited(algorithm, limits));
        assert_eq!(report.status, EngineStatus::ResourceLimitHit, "{algorithm:?}");
        assert_eq!(report.statistics.goal_tests, 4, "{algorithm:?}");
    }
}

#[test]
fn evaluation_budget_is_never_exceeded() {
    for algorithm in ALL_ALGORITHMS {
        let limits = ResourceLimits {
            max_evaluations: Some(10),
            ..ResourceLimits::unlimited()
        };
        let report = run_tile(SEED, &limited(algorithm, limits));
        assert_eq!(report.status, EngineStatus::ResourceLimitHit, "{algorithm:?}");
        assert!(report.statistics.evaluations <= 10, "{algorithm:?}");
    }
}

#[test]
fn zero_evaluation_budget_leaves_the_root_unscored() {
    for algorithm in ALL_ALGORITHMS {
        let limits = ResourceLimits {
            max_evaluations: Some(0),
            ..ResourceLimits::unlimited()
        };
        let report = run_tile(SEED, &limited(algorithm, limits));
        assert_eq!(report.status, EngineStatus::ResourceLimitHit, "{algorithm:?}");
        assert_eq!(report.statistics.evaluations, 0, "{algorithm:?}");
        assert_eq!(report.statistics.goal_tests, 0, "{algorithm:?}");
        assert!(report.thresholds.is_empty(), "{algorithm:?}");
    }
}

#[test]
fn zero_time_budget_stops_before_the_first_expansion() {
    for algorithm in ALL_ALGORITHMS {
        let limits = ResourceLimits {
            time_limit_ms: Some(0),
            ..ResourceLimits::unlimited()
        };
        let report = run_tile(SEED, &limited(algorithm, limits));
        assert_eq!(report.status, EngineStatus::ResourceLimitHit, "{algorithm:?}");
        assert_eq!(report.statistics.successor_calls, 0, "{algorithm:?}");
    }
}

#[test]
fn generous_budgets_do_not_interfere() {
    for algorithm in ALL_ALGORITHMS {
        let limits = ResourceLimits {
            max_successor_calls: Some(1_000_000),
            max_states_generated: Some(10_000_000),
            ..ResourceLimits::unlimited()
        };
        let bounded = run_tile(SEED, &limited(algorithm, limits));
        let free = run_tile(SEED, &RunConfigV1::for_algorithm(algorithm));
        assert_eq!(bounded.status, EngineStatus::SearchCompleted, "{algorithm:?}");
        assert_eq!(bounded.plan, free.plan, "{algorithm:?}");
    }
}

// ---------------------------------------------------------------------------
// Not ready
// ---------------------------------------------------------------------------

#[test]
fn engines_missing_collaborators_refuse_to_start() {
    let (puzzle, start) = tile_instance(SEED);
    let g = GCostEvaluator::new();

    let mut no_hasher = BestFirstSearch::<TileBoard, Move>::default()
        .with_successor_rule(&puzzle)
        .with_goal_test(&puzzle)
        .with_tie_breaker(&g, Preference::Lower);
    assert_eq!(no_hasher.status(), EngineStatus::NotReady);
    assert_eq!(no_hasher.initialize_search(start.clone()), EngineStatus::NotReady);
    assert_eq!(no_hasher.search_step(), EngineStatus::NotReady);
    assert_eq!(no_hasher.statistics().evaluations, 0);
    assert!(no_hasher.nodes().is_empty());

    let mut no_secondary = FocalSearch::<TileBoard, Move>::new(FocalConfig::default())
        .with_successor_rule(&puzzle)
        .with_goal_test(&puzzle)
        .with_hasher(&puzzle)
        .with_primary(&g, Preference::Lower);
    assert_eq!(no_secondary.search_for_plan(start.clone()), EngineStatus::NotReady);
    assert!(no_secondary.incumbent().is_none());

    let mut no_evaluator =
        IterativeDeepeningSearch::<TileBoard, Move>::new(IterativeDeepeningConfig::default())
            .with_successor_rule(&puzzle)
            .with_goal_test(&puzzle);
    assert_eq!(no_evaluator.search_for_plan(start), EngineStatus::NotReady);
    assert_eq!(no_evaluator.statistics().goal_tests, 0);
}

#[test]
fn engine_without_domain_is_not_ready() {
    let (puzzle, start) = tile_instance(SEED);
    let g = GCostEvaluator::new();
    let mut engine = BestFirstSearch::<TileBoard, Move>::default()
        .with_hasher(&puzzle)
        .with_tie_breaker(&g, Preference::Lower);
    assert_eq!(engine.initialize_search(start), EngineStatus::NotReady);
}

// ---------------------------------------------------------------------------
// Restart
// ---------------------------------------------------------------------------

#[test]
fn stopped_engine_restarts_with_fresh_statistics() {
    let (puzzle, start) = tile_instance(SEED);
    let heuristic = HeuristicEvaluator::new(|b: &TileBoard| puzzle.heuristic(b));
    let h: &dyn Evaluator<TileBoard, Move> = &heuristic;
    let f = FCostEvaluator::new(h);
    let g = GCostEvaluator::new();
    let mut engine = BestFirstSearch::<TileBoard, Move>::default()
        .with_successor_rule(&puzzle)
        .with_goal_test(&puzzle)
        .with_hasher(&puzzle)
        .with_limits(ResourceLimits {
            max_successor_calls: Some(3),
            ..ResourceLimits::unlimited()
        })
        .with_tie_breaker(&f, Preference::Lower)
        .with_tie_breaker(&g, Preference::Higher);

    assert_eq!(engine.search_for_plan(start.clone()), EngineStatus::ResourceLimitHit);
    let first = engine.statistics().clone();

    assert_eq!(engine.search_for_plan(start), EngineStatus::ResourceLimitHit);
    let second = engine.statistics();
    assert_eq!(second.successor_calls, 3);
    assert_eq!(second.evaluations, first.evaluations);
    assert_eq!(second.states_generated, first.states_generated);
}

#[test]
fn step_after_completion_is_a_no_op() {
    let (puzzle, _) = tile_instance(SEED);
    let heuristic = HeuristicEvaluator::new(|b: &TileBoard| puzzle.heuristic(b));
    let h: &dyn Evaluator<TileBoard, Move> = &heuristic;
    let f = FCostEvaluator::new(h);
    let mut engine = BestFirstSearch::<TileBoard, Move>::default()
        .with_successor_rule(&puzzle)
        .with_goal_test(&puzzle)
        .with_hasher(&puzzle)
        .with_tie_breaker(&f, Preference::Lower);

    assert_eq!(engine.search_for_plan(puzzle.goal_board()), EngineStatus::SearchCompleted);
    let goal_tests = engine.statistics().goal_tests;
    assert_eq!(engine.search_step(), EngineStatus::SearchCompleted);
    assert_eq!(engine.statistics().goal_tests, goal_tests);
    assert!(engine.incumbent().is_some());
}
