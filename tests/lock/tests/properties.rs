//! Property tests: open-list heap order under arbitrary operation sequences,
//! duplicate reconciliation on random graphs, and evaluator caching.

use std::cell::Cell;
use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;
use wayfinder_harness::contract::SearchWorld;
use wayfinder_harness::worlds::explicit_graph::{Edge, ExplicitGraph};
use wayfinder_search::engine::{EngineStatus, SearchAlgorithm};
use wayfinder_search::evaluator::{
    Estimate, Evaluator, FCostEvaluator, GCostEvaluator, Heuristic, HeuristicEvaluator,
};
use wayfinder_search::frontier::{OpenList, Preference, TieBreaker};
use wayfinder_search::node::{NodeId, NodeStore};
use wayfinder_search::policy::{BestFirstConfig, FocalConfig};
use wayfinder_search::{BestFirstSearch, FocalSearch};

/// Store holding one node per value; node `i` has state `values[i]`.
fn store_of(values: &[u32]) -> NodeStore<u32, ()> {
    let mut nodes = NodeStore::new();
    let root = nodes.add_root(values[0]);
    for &v in &values[1..] {
        nodes.add_child(v, root, 0.0, (), 0.0);
    }
    nodes
}

#[derive(Debug, Clone)]
enum Op {
    Pop,
    Remove(usize),
    Rescore(usize, u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Pop),
        (0usize..64).prop_map(Op::Remove),
        (0usize..64, 0u32..100).prop_map(|(i, v)| Op::Rescore(i, v)),
    ]
}

// ---------------------------------------------------------------------------
// Open list
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn heap_order_survives_any_operation_sequence(
        values in prop::collection::vec(0u32..100, 1..64),
        ops in prop::collection::vec(op_strategy(), 0..64),
    ) {
        let nodes = store_of(&values);
        let heuristic = HeuristicEvaluator::new(|s: &u32| Estimate::new(f64::from(*s)));
        let h: &dyn Evaluator<u32, ()> = &heuristic;
        h.prepare_to_evaluate();
        let mut open = OpenList::new(vec![TieBreaker::new(h, Preference::Lower)]);
        for i in 0..values.len() {
            h.evaluate(NodeId(i), &nodes);
            open.add_to_open(NodeId(i));
        }
        prop_assert!(open.heap_invariant_holds());

        for op in ops {
            match op {
                Op::Pop => {
                    if let Some(best) = open.pop_best() {
                        let score = h.cached_eval(best);
                        prop_assert!(open.iter().all(|id| h.cached_eval(id) >= score));
                    }
                }
                Op::Remove(i) => {
                    let id = NodeId(i % values.len());
                    let was_open = open.contains(id);
                    prop_assert_eq!(open.remove(id), was_open);
                    prop_assert!(!open.contains(id));
                }
                Op::Rescore(i, v) => {
                    let id = NodeId(i % values.len());
                    if open.contains(id) {
                        h.set_cached_eval(id, f64::from(v), false).unwrap();
                        open.eval_changed(id);
                    }
                }
            }
            prop_assert!(open.heap_invariant_holds());
        }

        let mut previous = f64::NEG_INFINITY;
        while let Some(id) = open.pop_best() {
            let score = h.cached_eval(id);
            prop_assert!(score >= previous);
            previous = score;
        }
        prop_assert!(open.high_water() <= values.len());
    }
}

// ---------------------------------------------------------------------------
// Duplicate reconciliation
// ---------------------------------------------------------------------------

/// Shortest distance from every vertex to `goal` (Bellman-Ford on the
/// reversed edge list).
fn distances_to(goal: usize, n: usize, edges: &BTreeMap<(usize, usize), u32>) -> Vec<f64> {
    let mut dist = vec![f64::INFINITY; n];
    dist[goal] = 0.0;
    for _ in 0..n {
        for (&(from, to), &cost) in edges {
            let via = dist[to] + f64::from(cost);
            if via < dist[from] {
                dist[from] = via;
            }
        }
    }
    dist
}

/// Random graph on `n` vertices, start `0`, goal `n - 1`, with an
/// admissible heuristic scaled down from the true distance by a random
/// per-vertex factor (so usually inconsistent).
fn random_world(
    n: usize,
    raw_edges: &[(usize, usize, u32)],
    scales: &[f64],
) -> (ExplicitGraph, f64) {
    let mut edges = BTreeMap::new();
    for &(from, to, cost) in raw_edges {
        edges.entry((from % n, to % n)).or_insert(cost);
    }
    let goal = n - 1;
    let dist = distances_to(goal, n, &edges);

    let mut graph = ExplicitGraph::new("random");
    for v in 0..n {
        let h = if dist[v].is_finite() { dist[v] * scales[v % scales.len()] } else { 0.0 };
        graph.add_vertex(format!("v{v}"), h);
    }
    for (&(from, to), &cost) in &edges {
        graph.add_edge(from, to, f64::from(cost));
    }
    graph.mark_goal(goal);
    (graph, dist[0])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn reopening_best_first_is_optimal_with_unique_nodes(
        n in 2usize..12,
        raw_edges in prop::collection::vec((0usize..12, 0usize..12, 0u32..10), 0..40),
        scales in prop::collection::vec(0.0f64..=1.0, 1..12),
    ) {
        let (graph, optimal) = random_world(n, &raw_edges, &scales);
        let heuristic = HeuristicEvaluator::new(|v: &usize| graph.heuristic(v));
        let h: &dyn Evaluator<usize, Edge> = &heuristic;
        let f = FCostEvaluator::new(h);
        let g = GCostEvaluator::new();
        let mut engine = BestFirstSearch::<usize, Edge>::new(BestFirstConfig { reexpand: true })
            .with_successor_rule(&graph)
            .with_goal_test(&graph)
            .with_hasher(&graph)
            .with_tie_breaker(&f, Preference::Lower)
            .with_tie_breaker(&g, Preference::Higher);

        prop_assert_eq!(engine.search_for_plan(0), EngineStatus::SearchCompleted);
        match engine.incumbent() {
            Some(plan) => prop_assert!((plan.cost - optimal).abs() < 1e-9),
            None => prop_assert!(optimal.is_infinite()),
        }

        let nodes = engine.nodes();
        let states: HashSet<usize> = (0..nodes.len()).map(|i| *nodes.state(NodeId(i))).collect();
        prop_assert_eq!(states.len(), nodes.len());
        prop_assert!(nodes.len() <= graph.vertex_count());
    }

    #[test]
    fn focal_cost_is_within_weight_of_optimal(
        n in 2usize..12,
        raw_edges in prop::collection::vec((0usize..12, 0usize..12, 0u32..10), 0..40),
        scales in prop::collection::vec(0.0f64..=1.0, 1..12),
        weight in 1.0f64..3.0,
    ) {
        let (graph, optimal) = random_world(n, &raw_edges, &scales);
        let heuristic = HeuristicEvaluator::new(|v: &usize| graph.heuristic(v));
        let h: &dyn Evaluator<usize, Edge> = &heuristic;
        let f = FCostEvaluator::new(h);
        let g = GCostEvaluator::new();
        let mut engine = FocalSearch::<usize, Edge>::new(FocalConfig { weight, reexpand: true })
            .with_successor_rule(&graph)
            .with_goal_test(&graph)
            .with_hasher(&graph)
            .with_primary(&f, Preference::Lower)
            .with_primary(&g, Preference::Higher)
            .with_secondary(h);

        prop_assert_eq!(engine.search_for_plan(0), EngineStatus::SearchCompleted);
        match engine.incumbent() {
            Some(plan) => prop_assert!(plan.cost <= weight * optimal + 1e-9),
            None => prop_assert!(optimal.is_infinite()),
        }
        prop_assert!(engine.partition_holds());
    }
}

// ---------------------------------------------------------------------------
// Evaluator caching
// ---------------------------------------------------------------------------

struct Counting {
    calls: Cell<usize>,
}

impl Heuristic<u32> for Counting {
    fn estimate(&self, state: &u32) -> Estimate {
        self.calls.set(self.calls.get() + 1);
        Estimate::new(f64::from(*state))
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn evaluation_is_idempotent_within_a_round(
        values in prop::collection::vec(0u32..100, 1..32),
        new_g in prop::collection::vec(0u32..50, 1..32),
    ) {
        let mut nodes = store_of(&values);
        let heuristic = HeuristicEvaluator::new(Counting { calls: Cell::new(0) });
        let h: &dyn Evaluator<u32, ()> = &heuristic;
        let f = FCostEvaluator::new(h);

        for i in 0..values.len() {
            let id = NodeId(i);
            f.prepare_to_evaluate();
            f.evaluate(id, &nodes);
            let first = f.cached_eval(id);
            f.evaluate(id, &nodes);
            prop_assert_eq!(f.cached_eval(id), first);
            prop_assert_eq!(heuristic.heuristic().calls.get(), i + 1);
        }

        // Path changes: f follows g, the path-independent h is not recomputed.
        let calls = heuristic.heuristic().calls.get();
        for (i, &g) in new_g.iter().enumerate().take(values.len()) {
            let id = NodeId(i);
            nodes.set_g_value(id, f64::from(g));
            f.prepare_to_evaluate();
            f.re_evaluate(id, &nodes);
            f.re_evaluate(id, &nodes);
            prop_assert_eq!(f.cached_eval(id), f64::from(g) + f64::from(values[i]));
        }
        prop_assert_eq!(heuristic.heuristic().calls.get(), calls);
    }
}
