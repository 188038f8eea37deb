use std::any::Any;

use super::{LockInfo, LockInfoBase};
use crate::id::{ActionId, GroupId, StrategyId, UniqueId};

/// Admission ceiling for a `ConcurrencyLimited` group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyLimit {
    Unlimited,
    Limited(usize),
}

/// Lock info for the `ConcurrencyLimited` strategy: up to `limit` concurrent
/// holders sharing `concurrency_id`, counted per boundary.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimitedInfo {
    base: LockInfoBase,
    pub concurrency_id: GroupId,
    pub limit: ConcurrencyLimit,
}

impl ConcurrencyLimitedInfo {
    pub fn new(action_id: impl Into<ActionId>, concurrency_id: impl Into<GroupId>, limit: ConcurrencyLimit) -> Self {
        Self {
            base: LockInfoBase::new(action_id, StrategyId::new("concurrencyLimited"), false),
            concurrency_id: concurrency_id.into(),
            limit,
        }
    }
}

impl LockInfo for ConcurrencyLimitedInfo {
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
            "ConcurrencyLimited(action=`{}`, group=`{}`, limit={:?})",
            self.base.action_id, self.concurrency_id, self.limit
        )
    }

    fn debug_additional_info(&self) -> Option<String> {
        Some(format!("concurrency_id=`{}`, limit={:?}", self.concurrency_id, self.limit))
    }

    fn clone_box(&self) -> Box<dyn LockInfo> {
        Box::new(self.clone())
    }
}
