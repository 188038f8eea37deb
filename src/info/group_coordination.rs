use std::any::Any;

use super::{LockInfo, LockInfoBase};
use crate::id::{ActionId, GroupId, StrategyId, UniqueId};

/// Entry rule a leader applies to the group(s) it joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupEntryPolicy {
    /// The group must have no existing holders at all.
    EmptyGroupOnly,
    /// The group must have no existing leader (other members are fine).
    NoLeaderPresent,
    /// The group must have no existing members (another leader is fine).
    NoMembersPresent,
}

/// Whether an info is entering its group(s) as leader or as a follower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRole {
    Leader(GroupEntryPolicy),
    Member,
}

/// Lock info for the `GroupCoordinated` strategy: joins one or more named
/// groups either as their leader (subject to an entry policy) or as a member
/// (which requires a leader already present).
#[derive(Debug, Clone)]
pub struct GroupCoordinatedInfo {
    base: LockInfoBase,
    pub groups: Vec<GroupId>,
    pub role: GroupRole,
}

impl GroupCoordinatedInfo {
    pub fn new(action_id: impl Into<ActionId>, groups: Vec<GroupId>, role: GroupRole) -> Self {
        Self {
            base: LockInfoBase::new(action_id, StrategyId::new("groupCoordinated"), false),
            groups,
            role,
        }
    }
}

impl LockInfo for GroupCoordinatedInfo {
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
            "GroupCoordinated(action=`{}`, groups={:?}, role={:?})",
            self.base.action_id, self.groups, self.role
        )
    }

    fn debug_additional_info(&self) -> Option<String> {
        Some(format!("groups={:?}, role={:?}", self.groups, self.role))
    }

    fn clone_box(&self) -> Box<dyn LockInfo> {
        Box::new(self.clone())
    }
}
