use std::any::Any;

use super::{LockInfo, LockInfoBase};
use crate::id::{ActionId, StrategyId, UniqueId};

/// What uniqueness `SingleExecution` enforces within a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// No exclusivity; always admits.
    None,
    /// At most one action of any kind may hold the boundary at a time.
    Boundary,
    /// At most one instance of *this* action id may hold the boundary.
    Action,
}

/// Lock info for the `SingleExecution` strategy.
#[derive(Debug, Clone)]
pub struct SingleExecutionInfo {
    base: LockInfoBase,
    pub mode: ExecutionMode,
}

impl SingleExecutionInfo {
    pub fn new(action_id: impl Into<ActionId>, mode: ExecutionMode) -> Self {
        Self {
            base: LockInfoBase::new(action_id, StrategyId::new("singleExecution"), false),
            mode,
        }
    }
}

impl LockInfo for SingleExecutionInfo {
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
        format!(
            "SingleExecution(action=`{}`, mode={:?})",
            self.base.action_id, self.mode
        )
    }

    fn debug_additional_info(&self) -> Option<String> {
        Some(format!("mode={:?}", self.mode))
    }

    fn clone_box(&self) -> Box<dyn LockInfo> {
        Box::new(self.clone())
    }
}
