//! World contract: what a domain implements to be run by the harness.

use wayfinder_search::contract::{GoalTest, StateHasher, SuccessorRule};
use wayfinder_search::evaluator::Estimate;

/// A searchable world.
///
/// A world provides successor generation, a goal test, a perfect state hash,
/// and an admissible heuristic. It does NOT choose an algorithm, set
/// budgets, or render reports; those are runner concerns.
pub trait SearchWorld<S, A>: SuccessorRule<S, A> + GoalTest<S> + StateHasher<S> {
    /// Unique world identifier (e.g., `"sliding_tile_3x4"`).
    fn world_id(&self) -> &str;

    /// Cost-to-go estimate for `state`.
    fn heuristic(&self, state: &S) -> Estimate;

    /// Stable human-readable rendering of `action`, used in reports.
    fn describe_action(&self, action: &A) -> String;
}
