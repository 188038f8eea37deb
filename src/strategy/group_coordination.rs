use std::collections::HashMap;

use super::Strategy;
use crate::error::{strategy_error, StrategyErrorKind};
use crate::id::{BoundaryId, StrategyId};
use crate::info::{GroupCoordinatedInfo, GroupEntryPolicy, GroupRole};
use crate::state::{BoundaryStateInner, BoundaryStateStore};
use crate::verdict::Verdict;

/// Coordinates leader/member entry across one or more named groups. A
/// leader's [`GroupEntryPolicy`] governs what it tolerates already being
/// present in each group it joins; a member always requires a leader.
///
/// Groups are checked in the order they appear on the info; the first
/// failing group produces the refusal.
pub struct GroupCoordinationStrategy {
    state: BoundaryStateStore<GroupCoordinatedInfo>,
    id: StrategyId,
}

impl GroupCoordinationStrategy {
    pub fn new() -> Self {
        Self {
            state: BoundaryStateStore::new(),
            id: StrategyId::new("groupCoordinated"),
        }
    }
}

impl Default for GroupCoordinationStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupCoordinationStrategy {
    /// Pure admission check against an already-locked boundary state; used
    /// by both `can_acquire` (read-only) and `try_acquire` (which commits
    /// under the same lock acquisition if this admits).
    fn evaluate(
        id: &StrategyId,
        state: &BoundaryStateInner<GroupCoordinatedInfo>,
        boundary: &BoundaryId,
        info: &GroupCoordinatedInfo,
    ) -> Verdict {
        for group in &info.groups {
            let members: Vec<&GroupCoordinatedInfo> =
                state.iter().filter(|existing| existing.groups.contains(group)).collect();

            let refusal = match info.role {
                GroupRole::Leader(GroupEntryPolicy::EmptyGroupOnly) => {
                    (!members.is_empty()).then(|| StrategyErrorKind::GroupNotEmpty { group: group.clone() })
                }
                GroupRole::Leader(GroupEntryPolicy::NoLeaderPresent) => members
                    .iter()
                    .any(|m| matches!(m.role, GroupRole::Leader(_)))
                    .then(|| StrategyErrorKind::GroupLeaderPresent { group: group.clone() }),
                GroupRole::Leader(GroupEntryPolicy::NoMembersPresent) => members
                    .iter()
                    .any(|m| matches!(m.role, GroupRole::Member))
                    .then(|| StrategyErrorKind::GroupMembersPresent { group: group.clone() }),
                GroupRole::Member => (!members.iter().any(|m| matches!(m.role, GroupRole::Leader(_))))
                    .then(|| StrategyErrorKind::GroupLeaderAbsent { group: group.clone() }),
            };

            if let Some(kind) = refusal {
                return Verdict::Refuse(strategy_error(boundary, info.action_id(), info.unique_id(), id, kind));
            }
        }
        Verdict::Admit
    }
}

impl Strategy<GroupCoordinatedInfo> for GroupCoordinationStrategy {
    fn can_acquire(&self, boundary: &BoundaryId, info: &GroupCoordinatedInfo) -> Verdict {
        self.state
            .with_state(boundary, |state| Self::evaluate(&self.id, state, boundary, info))
    }

    fn acquire(&self, boundary: &BoundaryId, info: &GroupCoordinatedInfo) {
        self.state.with_state(boundary, |state| state.push(info.clone()));
        tracing::debug!(strategy = %self.id, action = %info.action_id(), groups = ?info.groups, "group lock acquired");
    }

    /// Check and commit under a single hold of the boundary's lock, so a
    /// leader-absence or empty-group check can never race another arrival's
    /// commit for the same group.
    fn try_acquire(&self, boundary: &BoundaryId, info: &GroupCoordinatedInfo) -> Verdict {
        let verdict = self.state.with_state(boundary, |state| {
            let verdict = Self::evaluate(&self.id, state, boundary, info);
            if verdict.is_admit() {
                state.push(info.clone());
            }
            verdict
        });
        if verdict.is_admit() {
            tracing::debug!(strategy = %self.id, action = %info.action_id(), groups = ?info.groups, "group lock acquired");
            if crate::config::debug_logging_enabled() {
                tracing::trace!(strategy = %self.id, additional = ?info.debug_additional_info(), "group lock acquire detail");
            }
        }
        verdict
    }

    fn release(&self, boundary: &BoundaryId, info: &GroupCoordinatedInfo) {
        self.state.with_state(boundary, |state| {
            state.remove(info.unique_id());
        });
        tracing::debug!(strategy = %self.id, action = %info.action_id(), "group lock released");
    }

    fn clear_all(&self) {
        self.state.clear_all();
    }

    fn clear(&self, boundary: &BoundaryId) {
        self.state.clear(boundary);
    }

    fn current_locks(&self) -> HashMap<BoundaryId, Vec<GroupCoordinatedInfo>> {
        self.state.current_locks()
    }

    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }
}
