//! Domain contract traits.
//!
//! A problem domain plugs into the engine through three small traits: a
//! [`SuccessorRule`] that enumerates and applies actions, a [`GoalTest`], and
//! a [`StateHasher`] used for duplicate detection. Engines hold these as
//! borrowed trait objects and never see the concrete domain types.

/// Successor generation for a state space.
///
/// # Contract
///
/// - `actions` must return only actions for which `is_applicable` holds.
/// - Enumeration must be deterministic: same state → same actions in the
///   same order. Engines that shuffle do so with their own seeded generator.
/// - Action costs must be non-negative.
pub trait SuccessorRule<S, A> {
    /// Enumerate the actions applicable in `state`.
    fn actions(&self, state: &S) -> Vec<A>;

    /// Whether `action` can be applied in `state`.
    fn is_applicable(&self, state: &S, action: &A) -> bool;

    /// Apply `action` to `state` in place.
    fn apply_action(&self, state: &mut S, action: &A);

    /// Produce the state reached by applying `action` to `state`.
    fn child_state(&self, state: &S, action: &A) -> S
    where
        S: Clone,
    {
        let mut child = state.clone();
        self.apply_action(&mut child, action);
        child
    }

    /// Cost of applying `action` in `state`.
    fn action_cost(&self, state: &S, action: &A) -> f64;

    /// The action that undoes `action` when applied in `state`, if any.
    ///
    /// `state` is the state *reached* by `action`; the returned action leads
    /// back to its predecessor.
    fn inverse(&self, state: &S, action: &A) -> Option<A>;

    /// Whether `state` is a legal state of the domain.
    fn is_valid_state(&self, _state: &S) -> bool {
        true
    }
}

/// Goal detection.
pub trait GoalTest<S> {
    /// Test whether `state` satisfies the goal.
    fn is_goal(&self, state: &S) -> bool;
}

/// State hashing for duplicate detection.
///
/// Equal states must hash identically. Engines that reconcile duplicates
/// additionally require distinct states to hash distinctly; this is a caller
/// precondition and is never verified at runtime.
pub trait StateHasher<S> {
    /// Hash key identifying `state`.
    fn hash_value(&self, state: &S) -> u64;

    /// Caller assertion that `hash_value` is collision-free.
    fn is_perfect(&self) -> bool;
}
