//! Arbitration strategies: the pluggable admission algorithms the facade
//! consults through the [`Container`](crate::container::Container).

mod composite;
mod concurrency_limited;
mod dynamic_condition;
mod group_coordination;
mod priority;
mod single_execution;

pub use composite::CompositeStrategy;
pub use concurrency_limited::ConcurrencyLimitedStrategy;
pub use dynamic_condition::DynamicConditionStrategy;
pub use group_coordination::GroupCoordinationStrategy;
pub use priority::PriorityStrategy;
pub use single_execution::SingleExecutionStrategy;

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::id::{BoundaryId, StrategyId};
use crate::info::LockInfo;
use crate::verdict::Verdict;

/// The contract every arbitration strategy implements, parameterized over
/// the concrete [`LockInfo`] it admits.
///
/// `acquire`/`release`/`clear_all`/`clear` never fail: by the time `acquire`
/// is called, `can_acquire` has already returned an admitting verdict for
/// the same info, and strategies are required to be pure functions of their
/// own boundary state (no I/O, no panics).
pub trait Strategy<I: LockInfo>: Send + Sync {
    fn can_acquire(&self, boundary: &BoundaryId, info: &I) -> Verdict;
    fn acquire(&self, boundary: &BoundaryId, info: &I);
    fn release(&self, boundary: &BoundaryId, info: &I);

    /// Check and, on an admitting verdict, commit in one step.
    ///
    /// `can_acquire` followed by a separate `acquire` call leaves a window
    /// between them during which another caller can also observe an
    /// admitting verdict for a boundary that is supposed to admit only one
    /// holder — two threads racing `SingleExecutionInfo::mode == Boundary`
    /// would both see `Admit` and both push a holder. The facade always
    /// goes through `try_acquire` for this reason; `can_acquire`/`acquire`
    /// remain available as the separate two-step calls the strategy
    /// contract above documents, for callers that need to inspect a
    /// verdict before deciding whether to commit it.
    ///
    /// The default implementation is the naive, non-atomic two-call
    /// sequence; every built-in strategy overrides it to perform the check
    /// and the commit under a single acquisition of its per-boundary lock.
    fn try_acquire(&self, boundary: &BoundaryId, info: &I) -> Verdict {
        let verdict = self.can_acquire(boundary, info);
        if verdict.is_admit() {
            self.acquire(boundary, info);
        }
        verdict
    }

    fn clear_all(&self);
    fn clear(&self, boundary: &BoundaryId);
    fn current_locks(&self) -> HashMap<BoundaryId, Vec<I>>
    where
        I: Clone;
    fn strategy_id(&self) -> StrategyId;
}

/// Forwards the type-agnostic parts of [`Strategy`] (everything but
/// `can_acquire`/`acquire`/`release`, which need the concrete `I`) so the
/// [`Container`](crate::container::Container) can act on every registered
/// strategy regardless of which `I` it was registered for.
pub(crate) trait StrategyOps: Send + Sync {
    fn clear_all(&self);
    fn clear(&self, boundary: &BoundaryId);
    fn strategy_id(&self) -> StrategyId;
}

impl<I, S> StrategyOps for S
where
    I: LockInfo,
    S: Strategy<I>,
{
    fn clear_all(&self) {
        Strategy::clear_all(self)
    }

    fn clear(&self, boundary: &BoundaryId) {
        Strategy::clear(self, boundary)
    }

    fn strategy_id(&self) -> StrategyId {
        Strategy::strategy_id(self)
    }
}

/// A strategy reduced to operating on `&dyn LockInfo`, used inside
/// [`CompositeStrategy`] where sub-strategies each have a different
/// concrete `I` and cannot be called through a single generic `Strategy<I>`.
pub(crate) trait ErasedStrategy: Send + Sync {
    fn can_acquire_erased(&self, boundary: &BoundaryId, info: &dyn LockInfo) -> Verdict;
    fn acquire_erased(&self, boundary: &BoundaryId, info: &dyn LockInfo);
    fn try_acquire_erased(&self, boundary: &BoundaryId, info: &dyn LockInfo) -> Verdict;
    fn release_erased(&self, boundary: &BoundaryId, info: &dyn LockInfo);
    fn clear_all_erased(&self);
    fn clear_erased(&self, boundary: &BoundaryId);
    fn strategy_id(&self) -> StrategyId;
}

struct ErasedStrategyAdapter<I, S> {
    inner: Arc<S>,
    _marker: std::marker::PhantomData<fn(&I)>,
}

impl<I, S> ErasedStrategy for ErasedStrategyAdapter<I, S>
where
    I: LockInfo,
    S: Strategy<I> + 'static,
{
    fn can_acquire_erased(&self, boundary: &BoundaryId, info: &dyn LockInfo) -> Verdict {
        match info.as_any().downcast_ref::<I>() {
            Some(typed) => self.inner.can_acquire(boundary, typed),
            None => Verdict::Refuse(crate::error::strategy_error(
                boundary,
                info.action_id(),
                info.unique_id(),
                info.strategy_id(),
                crate::error::StrategyErrorKind::InternalTypeMismatch {
                    strategy_id: self.inner.strategy_id(),
                },
            )),
        }
    }

    fn acquire_erased(&self, boundary: &BoundaryId, info: &dyn LockInfo) {
        if let Some(typed) = info.as_any().downcast_ref::<I>() {
            self.inner.acquire(boundary, typed);
        }
    }

    fn try_acquire_erased(&self, boundary: &BoundaryId, info: &dyn LockInfo) -> Verdict {
        match info.as_any().downcast_ref::<I>() {
            Some(typed) => self.inner.try_acquire(boundary, typed),
            None => Verdict::Refuse(crate::error::strategy_error(
                boundary,
                info.action_id(),
                info.unique_id(),
                info.strategy_id(),
                crate::error::StrategyErrorKind::InternalTypeMismatch {
                    strategy_id: self.inner.strategy_id(),
                },
            )),
        }
    }

    fn release_erased(&self, boundary: &BoundaryId, info: &dyn LockInfo) {
        if let Some(typed) = info.as_any().downcast_ref::<I>() {
            self.inner.release(boundary, typed);
        }
    }

    fn clear_all_erased(&self) {
        Strategy::clear_all(self.inner.as_ref())
    }

    fn clear_erased(&self, boundary: &BoundaryId) {
        Strategy::clear(self.inner.as_ref(), boundary)
    }

    fn strategy_id(&self) -> StrategyId {
        Strategy::strategy_id(self.inner.as_ref())
    }
}

/// Erase a concrete, `Arc`-shared strategy so it can sit alongside
/// differently-typed strategies inside a [`CompositeStrategy`].
pub fn erase<I, S>(strategy: Arc<S>) -> Arc<dyn ErasedStrategy>
where
    I: LockInfo,
    S: Strategy<I> + 'static,
{
    Arc::new(ErasedStrategyAdapter::<I, S> {
        inner: strategy,
        _marker: std::marker::PhantomData,
    })
}

/// Storage representation the [`Container`](crate::container::Container)
/// keeps for one registered strategy: a downcastable handle for `resolve`
/// plus a type-erased handle for `clear`/`clear_all`, both pointing at the
/// same underlying instance.
pub(crate) struct RegisteredStrategy {
    pub(crate) any: Arc<dyn Any + Send + Sync>,
    pub(crate) ops: Arc<dyn StrategyOps>,
}

pub(crate) fn register_strategy<I, S>(strategy: S) -> RegisteredStrategy
where
    I: LockInfo,
    S: Strategy<I> + 'static,
{
    let concrete: Arc<S> = Arc::new(strategy);
    let typed: Arc<dyn Strategy<I> + Send + Sync> = concrete.clone();
    let any: Arc<dyn Any + Send + Sync> = Arc::new(typed);
    let ops: Arc<dyn StrategyOps> = concrete;
    RegisteredStrategy { any, ops }
}
