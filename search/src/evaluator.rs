//! Node evaluators and the two-phase caching protocol.
//!
//! Every evaluator caches one score and dead-end flag per [`NodeId`]. Scoring
//! happens in rounds: the engine calls [`Evaluator::prepare_to_evaluate`] on
//! every evaluator that will run, then [`Evaluator::evaluate`] (or
//! [`Evaluator::re_evaluate`]) for the node. Within a round a second
//! `evaluate` of the same node is a no-op, which lets several composite
//! evaluators wrap one shared heuristic without computing it twice.
//!
//! Evaluators are constructed by the caller and handed to engines by
//! reference. Caches use interior mutability so shared references suffice.

use std::cell::{Cell, RefCell};

use crate::error::EvaluatorError;
use crate::node::{NodeId, NodeStore};

/// A heuristic estimate with its dead-end flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub dead_end: bool,
}

impl Estimate {
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self {
            value,
            dead_end: false,
        }
    }

    /// An estimate marking the state as unable to reach any goal.
    #[must_use]
    pub fn dead_end() -> Self {
        Self {
            value: f64::INFINITY,
            dead_end: true,
        }
    }
}

/// Path-independent guidance supplied by a domain.
pub trait Heuristic<S> {
    /// Estimate the cost-to-go from `state`.
    fn estimate(&self, state: &S) -> Estimate;
}

impl<S, F> Heuristic<S> for F
where
    F: Fn(&S) -> Estimate,
{
    fn estimate(&self, state: &S) -> Estimate {
        self(state)
    }
}

/// Per-node score provider with a round-based cache.
///
/// # Contract
///
/// - `evaluate`/`re_evaluate` are idempotent until the next
///   `prepare_to_evaluate`.
/// - Composite evaluators forward `prepare_to_evaluate`, `evaluate` and
///   `re_evaluate` to the evaluators they wrap.
/// - `re_evaluate` recomputes only what depends on the node's path.
pub trait Evaluator<S, A> {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &str;

    /// Open a new scoring round.
    fn prepare_to_evaluate(&self);

    /// Score `id` unless it was already scored this round.
    fn evaluate(&self, id: NodeId, nodes: &NodeStore<S, A>);

    /// Re-score `id` after its path fields changed.
    fn re_evaluate(&self, id: NodeId, nodes: &NodeStore<S, A>);

    /// Last cached score for `id` (`+inf` if never scored).
    fn cached_eval(&self, id: NodeId) -> f64;

    /// Last cached dead-end flag for `id`.
    fn cached_is_dead_end(&self, id: NodeId) -> bool;

    /// Overwrite the cached entry for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluatorError::ReadOnly`] for evaluators that project node
    /// data instead of owning their scores.
    fn set_cached_eval(&self, id: NodeId, value: f64, dead_end: bool)
        -> Result<(), EvaluatorError>;

    /// Drop every cached entry.
    fn reset(&self);
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    value: f64,
    dead_end: bool,
    round: u64,
}

/// Round-stamped score cache shared by the built-in evaluators.
///
/// Exposed so domain crates can implement [`Evaluator`] directly with the
/// same caching discipline.
#[derive(Debug, Default)]
pub struct EvalCache {
    entries: RefCell<Vec<Option<CacheEntry>>>,
    round: Cell<u64>,
}

impl EvalCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new round; every entry becomes stale.
    pub fn begin_round(&self) {
        self.round.set(self.round.get().wrapping_add(1));
    }

    /// Whether `id` was scored during the current round.
    #[must_use]
    pub fn is_current(&self, id: NodeId) -> bool {
        let round = self.round.get();
        self.entry(id).is_some_and(|e| e.round == round)
    }

    /// Whether `id` was ever scored.
    #[must_use]
    pub fn has_entry(&self, id: NodeId) -> bool {
        self.entry(id).is_some()
    }

    /// Record a score for `id` in the current round.
    pub fn store(&self, id: NodeId, value: f64, dead_end: bool) {
        let mut entries = self.entries.borrow_mut();
        if entries.len() <= id.index() {
            entries.resize(id.index() + 1, None);
        }
        entries[id.index()] = Some(CacheEntry {
            value,
            dead_end,
            round: self.round.get(),
        });
    }

    /// Mark an existing entry as current without recomputing it.
    pub fn refresh(&self, id: NodeId) {
        let round = self.round.get();
        if let Some(Some(entry)) = self.entries.borrow_mut().get_mut(id.index()) {
            entry.round = round;
        }
    }

    #[must_use]
    pub fn value(&self, id: NodeId) -> f64 {
        self.entry(id).map_or(f64::INFINITY, |e| e.value)
    }

    #[must_use]
    pub fn dead_end(&self, id: NodeId) -> bool {
        self.entry(id).is_some_and(|e| e.dead_end)
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
        self.round.set(0);
    }

    fn entry(&self, id: NodeId) -> Option<CacheEntry> {
        self.entries.borrow().get(id.index()).copied().flatten()
    }
}

/// Read-only projection of the node store's g-values.
#[derive(Debug, Default)]
pub struct GCostEvaluator {
    cache: EvalCache,
}

impl GCostEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S, A> Evaluator<S, A> for GCostEvaluator {
    fn name(&self) -> &str {
        "g"
    }

    fn prepare_to_evaluate(&self) {
        self.cache.begin_round();
    }

    fn evaluate(&self, id: NodeId, nodes: &NodeStore<S, A>) {
        if !self.cache.is_current(id) {
            self.cache.store(id, nodes.g_value(id), false);
        }
    }

    fn re_evaluate(&self, id: NodeId, nodes: &NodeStore<S, A>) {
        self.cache.store(id, nodes.g_value(id), false);
    }

    fn cached_eval(&self, id: NodeId) -> f64 {
        self.cache.value(id)
    }

    fn cached_is_dead_end(&self, _id: NodeId) -> bool {
        false
    }

    fn set_cached_eval(
        &self,
        _id: NodeId,
        _value: f64,
        _dead_end: bool,
    ) -> Result<(), EvaluatorError> {
        Err(EvaluatorError::ReadOnly { name: "g".into() })
    }

    fn reset(&self) {
        self.cache.clear();
    }
}

/// Caches a path-independent domain [`Heuristic`].
///
/// `re_evaluate` reuses the cached estimate: a cheaper path does not change
/// the state, so the heuristic is never recomputed for it. Ids must keep
/// naming the same state between `evaluate` and `re_evaluate`.
#[derive(Debug)]
pub struct HeuristicEvaluator<H> {
    heuristic: H,
    cache: EvalCache,
}

impl<H> HeuristicEvaluator<H> {
    #[must_use]
    pub fn new(heuristic: H) -> Self {
        Self {
            heuristic,
            cache: EvalCache::new(),
        }
    }

    /// The wrapped heuristic.
    #[must_use]
    pub fn heuristic(&self) -> &H {
        &self.heuristic
    }
}

impl<S, A, H> Evaluator<S, A> for HeuristicEvaluator<H>
where
    H: Heuristic<S>,
{
    fn name(&self) -> &str {
        "h"
    }

    fn prepare_to_evaluate(&self) {
        self.cache.begin_round();
    }

    fn evaluate(&self, id: NodeId, nodes: &NodeStore<S, A>) {
        if self.cache.is_current(id) {
            return;
        }
        let estimate = self.heuristic.estimate(nodes.state(id));
        self.cache.store(id, estimate.value, estimate.dead_end);
    }

    fn re_evaluate(&self, id: NodeId, nodes: &NodeStore<S, A>) {
        if self.cache.has_entry(id) {
            self.cache.refresh(id);
        } else {
            Evaluator::<S, A>::evaluate(self, id, nodes);
        }
    }

    fn cached_eval(&self, id: NodeId) -> f64 {
        self.cache.value(id)
    }

    fn cached_is_dead_end(&self, id: NodeId) -> bool {
        self.cache.dead_end(id)
    }

    fn set_cached_eval(&self, id: NodeId, value: f64, dead_end: bool) -> Result<(), EvaluatorError> {
        self.cache.store(id, value, dead_end);
        Ok(())
    }

    fn reset(&self) {
        self.cache.clear();
    }
}

/// `g + weight * h` over a wrapped heuristic evaluator.
///
/// With `weight = 1` this is the classic A* ordering key.
pub struct FCostEvaluator<'e, S, A> {
    heuristic: &'e dyn Evaluator<S, A>,
    weight: f64,
    name: String,
    cache: EvalCache,
}

impl<'e, S, A> FCostEvaluator<'e, S, A> {
    /// `f = g + h`.
    #[must_use]
    pub fn new(heuristic: &'e dyn Evaluator<S, A>) -> Self {
        Self {
            heuristic,
            weight: 1.0,
            name: "f".into(),
            cache: EvalCache::new(),
        }
    }

    /// `f = g + weight * h`.
    #[must_use]
    pub fn weighted(heuristic: &'e dyn Evaluator<S, A>, weight: f64) -> Self {
        debug_assert!(weight >= 0.0, "negative heuristic weight {weight}");
        Self {
            heuristic,
            weight,
            name: format!("f[w={weight}]"),
            cache: EvalCache::new(),
        }
    }

    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// A non-finite estimate counts as a dead end whatever the weight.
    fn combine(&self, id: NodeId, nodes: &NodeStore<S, A>) {
        let h = self.heuristic.cached_eval(id);
        let dead_end = self.heuristic.cached_is_dead_end(id) || !h.is_finite();
        let value = if dead_end {
            f64::INFINITY
        } else {
            nodes.g_value(id) + self.weight * h
        };
        self.cache.store(id, value, dead_end);
    }
}

impl<S, A> Evaluator<S, A> for FCostEvaluator<'_, S, A> {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare_to_evaluate(&self) {
        self.cache.begin_round();
        self.heuristic.prepare_to_evaluate();
    }

    fn evaluate(&self, id: NodeId, nodes: &NodeStore<S, A>) {
        if self.cache.is_current(id) {
            return;
        }
        self.heuristic.evaluate(id, nodes);
        self.combine(id, nodes);
    }

    fn re_evaluate(&self, id: NodeId, nodes: &NodeStore<S, A>) {
        self.heuristic.re_evaluate(id, nodes);
        self.combine(id, nodes);
    }

    fn cached_eval(&self, id: NodeId) -> f64 {
        self.cache.value(id)
    }

    fn cached_is_dead_end(&self, id: NodeId) -> bool {
        self.cache.dead_end(id)
    }

    fn set_cached_eval(&self, id: NodeId, value: f64, dead_end: bool) -> Result<(), EvaluatorError> {
        self.cache.store(id, value, dead_end);
        Ok(())
    }

    fn reset(&self) {
        self.cache.clear();
        self.heuristic.reset();
    }
}
