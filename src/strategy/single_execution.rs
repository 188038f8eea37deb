use std::collections::HashMap;

use super::Strategy;
use crate::error::{strategy_error, StrategyErrorKind};
use crate::id::{BoundaryId, StrategyId};
use crate::info::{ExecutionMode, SingleExecutionInfo};
use crate::state::{BoundaryStateInner, BoundaryStateStore};
use crate::verdict::Verdict;

/// Enforces at most one holder per boundary (`ExecutionMode::Boundary`) or
/// per action id within a boundary (`ExecutionMode::Action`); `None` never
/// refuses.
pub struct SingleExecutionStrategy {
    state: BoundaryStateStore<SingleExecutionInfo>,
    id: StrategyId,
}

impl SingleExecutionStrategy {
    pub fn new() -> Self {
        Self {
            state: BoundaryStateStore::new(),
            id: StrategyId::new("singleExecution"),
        }
    }
}

impl Default for SingleExecutionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SingleExecutionStrategy {
    /// Pure admission check against an already-locked boundary state; used
    /// by both `can_acquire` (read-only) and `try_acquire` (which commits
    /// under the same lock acquisition if this admits).
    fn evaluate(
        id: &StrategyId,
        state: &BoundaryStateInner<SingleExecutionInfo>,
        boundary: &BoundaryId,
        info: &SingleExecutionInfo,
    ) -> Verdict {
        match info.mode {
            ExecutionMode::None => Verdict::Admit,
            ExecutionMode::Boundary => match state.oldest() {
                Some(existing) => Verdict::Refuse(strategy_error(
                    boundary,
                    info.action_id(),
                    info.unique_id(),
                    id,
                    StrategyErrorKind::BoundaryAlreadyLocked {
                        existing_action: existing.action_id().clone(),
                        existing_unique_id: existing.unique_id(),
                    },
                )),
                None => Verdict::Admit,
            },
            ExecutionMode::Action => match state.iter().find(|existing| existing.action_id() == info.action_id()) {
                Some(existing) => Verdict::Refuse(strategy_error(
                    boundary,
                    info.action_id(),
                    info.unique_id(),
                    id,
                    StrategyErrorKind::ActionAlreadyRunning {
                        existing_action: existing.action_id().clone(),
                        existing_unique_id: existing.unique_id(),
                    },
                )),
                None => Verdict::Admit,
            },
        }
    }
}

impl Strategy<SingleExecutionInfo> for SingleExecutionStrategy {
    fn can_acquire(&self, boundary: &BoundaryId, info: &SingleExecutionInfo) -> Verdict {
        self.state
            .with_state(boundary, |state| Self::evaluate(&self.id, state, boundary, info))
    }

    fn acquire(&self, boundary: &BoundaryId, info: &SingleExecutionInfo) {
        self.state.with_state(boundary, |state| state.push(info.clone()));
        tracing::debug!(strategy = %self.id, action = %info.action_id(), "single execution acquired");
    }

    /// Check and commit under a single hold of the boundary's lock, so two
    /// concurrent callers can never both observe `Admit` for a boundary
    /// this strategy is meant to admit only one holder into.
    fn try_acquire(&self, boundary: &BoundaryId, info: &SingleExecutionInfo) -> Verdict {
        let verdict = self.state.with_state(boundary, |state| {
            let verdict = Self::evaluate(&self.id, state, boundary, info);
            if verdict.is_admit() {
                state.push(info.clone());
            }
            verdict
        });
        if verdict.is_admit() {
            tracing::debug!(strategy = %self.id, action = %info.action_id(), "single execution acquired");
            if crate::config::debug_logging_enabled() {
                tracing::trace!(strategy = %self.id, additional = ?info.debug_additional_info(), "single execution acquire detail");
            }
        }
        verdict
    }

    fn release(&self, boundary: &BoundaryId, info: &SingleExecutionInfo) {
        self.state.with_state(boundary, |state| {
            state.remove(info.unique_id());
        });
        tracing::debug!(strategy = %self.id, action = %info.action_id(), "single execution released");
    }

    fn clear_all(&self) {
        self.state.clear_all();
    }

    fn clear(&self, boundary: &BoundaryId) {
        self.state.clear(boundary);
    }

    fn current_locks(&self) -> HashMap<BoundaryId, Vec<SingleExecutionInfo>> {
        self.state.current_locks()
    }

    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_mode_refuses_second_holder() {
        let strategy = SingleExecutionStrategy::new();
        let boundary = BoundaryId::new("screen".to_string());
        let a = SingleExecutionInfo::new("a", ExecutionMode::Boundary);
        let b = SingleExecutionInfo::new("b", ExecutionMode::Boundary);

        assert!(strategy.can_acquire(&boundary, &a).is_admit());
        strategy.acquire(&boundary, &a);
        assert!(strategy.can_acquire(&boundary, &b).is_refuse());

        strategy.release(&boundary, &a);
        assert!(strategy.can_acquire(&boundary, &b).is_admit());
    }

    #[test]
    fn action_mode_only_refuses_same_action() {
        let strategy = SingleExecutionStrategy::new();
        let boundary = BoundaryId::new("screen".to_string());
        let a1 = SingleExecutionInfo::new("a", ExecutionMode::Action);
        let a2 = SingleExecutionInfo::new("a", ExecutionMode::Action);
        let b1 = SingleExecutionInfo::new("b", ExecutionMode::Action);

        strategy.acquire(&boundary, &a1);
        assert!(strategy.can_acquire(&boundary, &a2).is_refuse());
        assert!(strategy.can_acquire(&boundary, &b1).is_admit());
    }

    #[test]
    fn none_mode_never_refuses() {
        let strategy = SingleExecutionStrategy::new();
        let boundary = BoundaryId::new("screen".to_string());
        let a = SingleExecutionInfo::new("a", ExecutionMode::None);
        let b = SingleExecutionInfo::new("b", ExecutionMode::None);
        strategy.acquire(&boundary, &a);
        assert!(strategy.can_acquire(&boundary, &b).is_admit());
    }
}
