use std::any::Any;
use std::cmp::Ordering;

use super::{LockInfo, LockInfoBase};
use crate::id::{ActionId, StrategyId, UniqueId};

/// Whether a priority level may be preempted by a later, higher-or-equal
/// priority arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriorityBehavior {
    /// Never preempted; a conflicting higher/equal priority is refused.
    Exclusive,
    /// May be displaced by a later higher-or-equal priority arrival.
    Replaceable,
}

/// Ranked priority level. `None` never blocks and never preempts; `Low` and
/// `High` carry a [`PriorityBehavior`] governing what happens on conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    None,
    Low(PriorityBehavior),
    High(PriorityBehavior),
}

impl Priority {
    fn rank(&self) -> u8 {
        match self {
            Priority::None => 0,
            Priority::Low(_) => 1,
            Priority::High(_) => 2,
        }
    }

    pub fn behavior(&self) -> Option<PriorityBehavior> {
        match self {
            Priority::None => None,
            Priority::Low(b) | Priority::High(b) => Some(*b),
        }
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// Lock info for the `PriorityBased` strategy.
#[derive(Debug, Clone)]
pub struct PriorityInfo {
    base: LockInfoBase,
    pub priority: Priority,
    /// When `true`, an equal-priority arrival from the *same* action id is
    /// refused rather than treated per the holder's behavior.
    pub blocks_same_action: bool,
}

impl PriorityInfo {
    pub fn new(action_id: impl Into<ActionId>, priority: Priority, blocks_same_action: bool) -> Self {
        let is_cancellation_target = priority.behavior() == Some(PriorityBehavior::Replaceable);
        Self {
            base: LockInfoBase::new(action_id, StrategyId::new("priorityBased"), is_cancellation_target),
            priority,
            blocks_same_action,
        }
    }
}

impl LockInfo for PriorityInfo {
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
            "PriorityBased(action=`{}`, priority={:?}, blocks_same_action={})",
            self.base.action_id, self.priority, self.blocks_same_action
        )
    }

    fn debug_additional_info(&self) -> Option<String> {
        Some(format!(
            "priority={:?}, blocks_same_action={}",
            self.priority, self.blocks_same_action
        ))
    }

    fn clone_box(&self) -> Box<dyn LockInfo> {
        Box::new(self.clone())
    }
}
