//! `ExplicitGraph`: a weighted directed graph given as an edge list.
//!
//! States are vertex indices. Each vertex carries a table heuristic value;
//! an infinite value marks the vertex as a dead end. Inverses exist only
//! where the reverse edge is present.

use serde::{Deserialize, Serialize};

use wayfinder_search::contract::{GoalTest, StateHasher, SuccessorRule};
use wayfinder_search::evaluator::Estimate;

use crate::contract::SearchWorld;

/// A directed edge used as a search action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone)]
struct Vertex {
    name: String,
    heuristic: f64,
    /// Outgoing `(target, cost)` pairs in insertion order.
    out: Vec<(usize, f64)>,
}

/// Explicit graph world.
#[derive(Debug, Clone)]
pub struct ExplicitGraph {
    id: String,
    vertices: Vec<Vertex>,
    goals: Vec<usize>,
}

impl ExplicitGraph {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vertices: Vec::new(),
            goals: Vec::new(),
        }
    }

    /// The five-vertex graph whose heuristic is admissible but inconsistent
    /// at `c`, so the optimal path is found only after `b` is reached twice.
    ///
    /// ```text
    /// a→b (5)   a→c (1)   b→d (1)   c→b (1)   d→goal (4)
    /// h: a=7  b=1  c=6  d=4  goal=0
    /// ```
    ///
    /// Returns the graph and the start vertex `a`.
    #[must_use]
    pub fn reopening_scenario() -> (Self, usize) {
        let mut graph = Self::new("explicit_graph_reopening");
        let a = graph.add_vertex("a", 7.0);
        let b = graph.add_vertex("b", 1.0);
        let c = graph.add_vertex("c", 6.0);
        let d = graph.add_vertex("d", 4.0);
        let goal = graph.add_vertex("goal", 0.0);
        graph.add_edge(a, b, 5.0);
        graph.add_edge(a, c, 1.0);
        graph.add_edge(b, d, 1.0);
        graph.add_edge(c, b, 1.0);
        graph.add_edge(d, goal, 4.0);
        graph.mark_goal(goal);
        (graph, a)
    }

    /// Add a vertex; returns its index.
    pub fn add_vertex(&mut self, name: impl Into<String>, heuristic: f64) -> usize {
        self.vertices.push(Vertex {
            name: name.into(),
            heuristic,
            out: Vec::new(),
        });
        self.vertices.len() - 1
    }

    /// Add a directed edge. Costs must be non-negative.
    pub fn add_edge(&mut self, from: usize, to: usize, cost: f64) {
        debug_assert!(to < self.vertices.len(), "unknown vertex {to}");
        debug_assert!(cost >= 0.0, "negative edge cost {cost}");
        self.vertices[from].out.push((to, cost));
    }

    pub fn mark_goal(&mut self, vertex: usize) {
        self.goals.push(vertex);
    }

    /// Index of the vertex called `name`.
    #[must_use]
    pub fn vertex(&self, name: &str) -> Option<usize> {
        self.vertices.iter().position(|v| v.name == name)
    }

    /// Name of vertex `index` (`"?"` when out of range).
    #[must_use]
    pub fn name(&self, index: usize) -> &str {
        self.vertices.get(index).map_or("?", |v| v.name.as_str())
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn edge_cost(&self, edge: &Edge) -> Option<f64> {
        self.vertices
            .get(edge.from)?
            .out
            .iter()
            .find(|(to, _)| *to == edge.to)
            .map(|(_, cost)| *cost)
    }
}

impl SuccessorRule<usize, Edge> for ExplicitGraph {
    fn actions(&self, state: &usize) -> Vec<Edge> {
        self.vertices.get(*state).map_or_else(Vec::new, |v| {
            v.out
                .iter()
                .map(|(to, _)| Edge {
                    from: *state,
                    to: *to,
                })
                .collect()
        })
    }

    fn is_applicable(&self, state: &usize, action: &Edge) -> bool {
        action.from == *state && self.edge_cost(action).is_some()
    }

    fn apply_action(&self, state: &mut usize, action: &Edge) {
        *state = action.to;
    }

    fn action_cost(&self, _state: &usize, action: &Edge) -> f64 {
        self.edge_cost(action).unwrap_or(f64::INFINITY)
    }

    fn inverse(&self, _state: &usize, action: &Edge) -> Option<Edge> {
        let back = Edge {
            from: action.to,
            to: action.from,
        };
        self.edge_cost(&back).map(|_| back)
    }

    fn is_valid_state(&self, state: &usize) -> bool {
        *state < self.vertices.len()
    }
}

impl GoalTest<usize> for ExplicitGraph {
    fn is_goal(&self, state: &usize) -> bool {
        self.goals.contains(state)
    }
}

impl StateHasher<usize> for ExplicitGraph {
    fn hash_value(&self, state: &usize) -> u64 {
        u64::try_from(*state).unwrap_or(u64::MAX)
    }

    fn is_perfect(&self) -> bool {
        true
    }
}

impl SearchWorld<usize, Edge> for ExplicitGraph {
    fn world_id(&self) -> &str {
        &self.id
    }

    fn heuristic(&self, state: &usize) -> Estimate {
        match self.vertices.get(*state) {
            Some(v) if v.heuristic.is_finite() => Estimate::new(v.heuristic),
            _ => Estimate::dead_end(),
        }
    }

    fn describe_action(&self, action: &Edge) -> String {
        format!("{}->{}", self.name(action.from), self.name(action.to))
    }
}
