//! Per-strategy acquisition-attempt payloads.
//!
//! Every strategy admits or refuses based on one concrete `LockInfo`
//! implementor. The common fields (`action_id`, `unique_id`, `strategy_id`,
//! `is_cancellation_target`) live on [`LockInfoBase`] and are embedded by
//! composition in every variant below, rather than via inheritance — there
//! is no `Self: Sized` trick that would keep the trait object-safe otherwise.

mod composite;
mod concurrency_limited;
mod dynamic_condition;
mod group_coordination;
mod priority;
mod single_execution;

pub use composite::CompositeInfo;
pub use concurrency_limited::{ConcurrencyLimit, ConcurrencyLimitedInfo};
pub use dynamic_condition::DynamicConditionInfo;
pub use group_coordination::{GroupCoordinatedInfo, GroupEntryPolicy, GroupRole};
pub use priority::{Priority, PriorityBehavior, PriorityInfo};
pub use single_execution::{ExecutionMode, SingleExecutionInfo};

use std::any::Any;
use std::fmt;

use crate::id::{ActionId, StrategyId, UniqueId};

/// The contract every lock-info variant satisfies, regardless of strategy.
///
/// Equality between two infos is by `unique_id` alone; the trait
/// deliberately does not require `PartialEq` since strategies compare by
/// that single field, not structurally.
pub trait LockInfo: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn action_id(&self) -> &ActionId;
    fn unique_id(&self) -> UniqueId;
    fn strategy_id(&self) -> &StrategyId;
    /// Whether this info represents a lock that may itself be preempted by a
    /// later arrival. Only `PriorityBased` (with `Replaceable` behavior)
    /// ever reports `true`.
    fn is_cancellation_target(&self) -> bool;
    fn debug_description(&self) -> String;
    fn debug_additional_info(&self) -> Option<String> {
        None
    }
    fn clone_box(&self) -> Box<dyn LockInfo>;
}

impl fmt::Debug for dyn LockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_description())
    }
}

impl Clone for Box<dyn LockInfo> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Fields shared by every [`LockInfo`] variant, held by composition.
#[derive(Debug, Clone)]
pub(crate) struct LockInfoBase {
    pub action_id: ActionId,
    pub unique_id: UniqueId,
    pub strategy_id: StrategyId,
    pub is_cancellation_target: bool,
}

impl LockInfoBase {
    pub(crate) fn new(
        action_id: impl Into<ActionId>,
        strategy_id: StrategyId,
        is_cancellation_target: bool,
    ) -> Self {
        Self {
            action_id: action_id.into(),
            unique_id: UniqueId::new(),
            strategy_id,
            is_cancellation_target,
        }
    }
}
