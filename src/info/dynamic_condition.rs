use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::{LockInfo, LockInfoBase};
use crate::id::{ActionId, StrategyId, UniqueId};

/// Lock info for the `DynamicCondition` strategy: admission is decided by
/// invoking a caller-supplied predicate at `can_acquire` time rather than by
/// inspecting boundary state. The predicate's error is an opaque message
/// rather than a generic associated error type — this keeps the strategy
/// object-safe and keeps `StrategyErrorKind::DynamicConditionRefused`
/// uniform, at the cost of structured caller errors (callers who need more
/// can encode it into the message and parse it back out).
#[derive(Clone)]
pub struct DynamicConditionInfo {
    base: LockInfoBase,
    condition: Arc<dyn Fn() -> Result<(), String> + Send + Sync>,
}

impl DynamicConditionInfo {
    pub fn new(
        action_id: impl Into<ActionId>,
        condition: impl Fn() -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            base: LockInfoBase::new(action_id, StrategyId::new("dynamicCondition"), false),
            condition: Arc::new(condition),
        }
    }

    pub fn evaluate(&self) -> Result<(), String> {
        (self.condition)()
    }
}

impl fmt::Debug for DynamicConditionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicConditionInfo")
            .field("action_id", &self.base.action_id)
            .finish_non_exhaustive()
    }
}

impl LockInfo for DynamicConditionInfo {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn action_id(&self) -> &ActionId {
        &self.base.action_id
    }

    fn unique_id(&self) -> UniqueId {
        self.base.unique_id
    }

    fn strategy_id(&self) -> &StrategyId {
        &self.base.strategy_id
    }

    fn is_cancellation_target(&self) -> bool {
        self.base.is_cancellation_target
    }

    fn debug_description(&self) -> String {
        format!("DynamicCondition(action=`{}`)", self.base.action_id)
    }

    fn debug_additional_info(&self) -> Option<String> {
        Some("condition=<opaque predicate>".to_string())
    }

    fn clone_box(&self) -> Box<dyn LockInfo> {
        Box::new(self.clone())
    }
}
