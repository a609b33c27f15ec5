//! Sliding-tile lock tests: engine plan costs against a brute-force
//! breadth-first oracle on scrambled 3×3 and 3×4 boards.

use lock_tests::scenarios::{
    eight_puzzle, focal_config, run_tile, tile_instance, BFS_STATE_CAP, TILE_SEEDS,
};
use wayfinder_harness::policy::{AlgorithmV1, RunConfigV1};
use wayfinder_harness::runner::run_search;
use wayfinder_harness::worlds::sliding_tile::{Move, SlidingTilePuzzle, TileBoard};
use wayfinder_search::engine::EngineStatus;

fn optimal_cost(seed: u64) -> f64 {
    let (puzzle, start) = tile_instance(seed);
    let depth = puzzle
        .bfs_optimal_cost(&start, BFS_STATE_CAP)
        .expect("3x3 boards are fully searchable");
    f64::from(depth)
}

// ---------------------------------------------------------------------------
// Admissible algorithms are optimal
// ---------------------------------------------------------------------------

#[test]
fn best_first_matches_breadth_first_oracle() {
    for seed in TILE_SEEDS {
        let report = run_tile(seed, &RunConfigV1::for_algorithm(AlgorithmV1::BestFirst));
        assert_eq!(report.status, EngineStatus::SearchCompleted);
        assert_eq!(report.plan_cost, Some(optimal_cost(seed)), "seed {seed}");
    }
}

#[test]
fn iterative_deepening_matches_breadth_first_oracle() {
    for seed in TILE_SEEDS {
        let config = RunConfigV1::for_algorithm(AlgorithmV1::IterativeDeepening);
        let report = run_tile(seed, &config);
        assert_eq!(report.plan_cost, Some(optimal_cost(seed)), "seed {seed}");
        // Thresholds grow strictly and stop at the optimal cost.
        assert!(report.thresholds.windows(2).all(|w| w[1] > w[0]), "seed {seed}");
        assert_eq!(report.thresholds.last().copied(), report.plan_cost, "seed {seed}");
    }
}

#[test]
fn focal_weight_one_is_optimal() {
    for seed in TILE_SEEDS {
        let report = run_tile(seed, &focal_config(1.0));
        assert_eq!(report.plan_cost, Some(optimal_cost(seed)), "seed {seed}");
    }
}

// ---------------------------------------------------------------------------
// Bounded suboptimality
// ---------------------------------------------------------------------------

#[test]
fn focal_respects_its_suboptimality_bound() {
    for weight in [1.5, 2.0, 3.0] {
        for seed in TILE_SEEDS {
            let report = run_tile(seed, &focal_config(weight));
            let cost = report.plan_cost.expect("focal solves every instance");
            let optimal = optimal_cost(seed);
            assert!(
                cost <= weight * optimal + 1e-9,
                "seed {seed}: cost {cost} > {weight} * {optimal}"
            );
        }
    }
}

#[test]
fn weighted_best_first_still_solves() {
    for seed in TILE_SEEDS {
        let config = RunConfigV1 {
            heuristic_weight: 3.0,
            ..RunConfigV1::default()
        };
        let report = run_tile(seed, &config);
        assert!(report.solved, "seed {seed}");
        assert!(report.plan_cost >= Some(optimal_cost(seed)), "seed {seed}");
    }
}

// ---------------------------------------------------------------------------
// Plans replay to the goal
// ---------------------------------------------------------------------------

#[test]
fn reported_plans_replay_to_the_goal() {
    use wayfinder_search::contract::SuccessorRule;

    let seed = TILE_SEEDS[0];
    let (puzzle, start) = tile_instance(seed);
    let report = run_search::<TileBoard, Move, _>(&puzzle, start.clone(), &RunConfigV1::default())
        .unwrap();

    let mut board = start;
    for name in &report.plan {
        let mv = Move::ALL
            .into_iter()
            .find(|m| m.to_string() == *name)
            .unwrap();
        assert!(puzzle.is_applicable(&board, &mv), "{name} not applicable");
        puzzle.apply_action(&mut board, &mv);
    }
    assert_eq!(board, puzzle.goal_board());
}

#[test]
fn three_by_four_best_first_is_optimal() {
    let puzzle = SlidingTilePuzzle::new(3, 4).unwrap();
    for seed in [5_u64, 11] {
        let start = puzzle.scramble(16, seed);
        let optimal = puzzle.bfs_optimal_cost(&start, 2_000_000).unwrap();
        let report = run_search::<TileBoard, Move, _>(&puzzle, start, &RunConfigV1::default())
            .unwrap();
        assert_eq!(report.world_id, "sliding_tile_3x4");
        assert_eq!(report.plan_cost, Some(f64::from(optimal)), "seed {seed}");
    }
}

#[test]
fn goal_start_yields_empty_plan() {
    let puzzle = eight_puzzle();
    let report =
        run_search::<TileBoard, Move, _>(&puzzle, puzzle.goal_board(), &RunConfigV1::default())
            .unwrap();
    assert!(report.solved);
    assert!(report.plan.is_empty());
    assert_eq!(report.plan_cost, Some(0.0));
    assert_eq!(report.statistics.successor_calls, 0);
}
