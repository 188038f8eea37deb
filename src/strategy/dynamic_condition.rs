use std::collections::HashMap;

use super::Strategy;
use crate::error::{strategy_error, StrategyErrorKind};
use crate::id::{BoundaryId, StrategyId};
use crate::info::DynamicConditionInfo;
use crate::state::BoundaryStateStore;
use crate::verdict::Verdict;

/// Admission is decided entirely by invoking the info's predicate; boundary
/// state is kept only so `release`/`current_locks`/`clear` behave like every
/// other strategy once an attempt has been admitted.
pub struct DynamicConditionStrategy {
    state: BoundaryStateStore<DynamicConditionInfo>,
    id: StrategyId,
}

impl DynamicConditionStrategy {
    pub fn new() -> Self {
        Self {
            state: BoundaryStateStore::new(),
            id: StrategyId::new("dynamicCondition"),
        }
    }
}

impl Default for DynamicConditionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy<DynamicConditionInfo> for DynamicConditionStrategy {
    fn can_acquire(&self, boundary: &BoundaryId, info: &DynamicConditionInfo) -> Verdict {
        match info.evaluate() {
            Ok(()) => Verdict::Admit,
            Err(message) => Verdict::Refuse(strategy_error(
                boundary,
                info.action_id(),
                info.unique_id(),
                &self.id,
                StrategyErrorKind::DynamicConditionRefused { message },
            )),
        }
    }

    fn acquire(&self, boundary: &BoundaryId, info: &DynamicConditionInfo) {
        self.state.with_state(boundary, |state| state.push(info.clone()));
        tracing::debug!(strategy = %self.id, action = %info.action_id(), "dynamic condition lock acquired");
    }

    /// The predicate itself consults nothing this strategy's boundary state
    /// holds, so there is no admission-check race to close here; the commit
    /// still happens under one `with_state` call, matching every other
    /// built-in strategy's `try_acquire`.
    fn try_acquire(&self, boundary: &BoundaryId, info: &DynamicConditionInfo) -> Verdict {
        let verdict = self.can_acquire(boundary, info);
        if verdict.is_admit() {
            self.state.with_state(boundary, |state| state.push(info.clone()));
            tracing::debug!(strategy = %self.id, action = %info.action_id(), "dynamic condition lock acquired");
            if crate::config::debug_logging_enabled() {
                tracing::trace!(strategy = %self.id, additional = ?info.debug_additional_info(), "dynamic condition acquire detail");
            }
        }
        verdict
    }

    fn release(&self, boundary: &BoundaryId, info: &DynamicConditionInfo) {
        self.state.with_state(boundary, |state| {
            state.remove(info.unique_id());
        });
        tracing::debug!(strategy = %self.id, action = %info.action_id(), "dynamic condition lock released");
    }

    fn clear_all(&self) {
        self.state.clear_all();
    }

    fn clear(&self, boundary: &BoundaryId) {
        self.state.clear(boundary);
    }

    fn current_locks(&self) -> HashMap<BoundaryId, Vec<DynamicConditionInfo>> {
        self.state.current_locks()
    }

    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }
}
