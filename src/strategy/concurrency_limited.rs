use std::collections::HashMap;

use super::Strategy;
use crate::error::{strategy_error, StrategyErrorKind};
use crate::id::{BoundaryId, StrategyId};
use crate::info::{ConcurrencyLimit, ConcurrencyLimitedInfo};
use crate::state::{BoundaryStateInner, BoundaryStateStore};
use crate::verdict::Verdict;

/// Admits up to `limit` concurrent holders sharing a `concurrency_id`,
/// counted per boundary (the documented choice where the source design left
/// "per boundary or globally" open — see DESIGN.md).
pub struct ConcurrencyLimitedStrategy {
    state: BoundaryStateStore<ConcurrencyLimitedInfo>,
    id: StrategyId,
}

impl ConcurrencyLimitedStrategy {
    pub fn new() -> Self {
        Self {
            state: BoundaryStateStore::new(),
            id: StrategyId::new("concurrencyLimited"),
        }
    }
}

impl Default for ConcurrencyLimitedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ConcurrencyLimitedStrategy {
    /// Pure admission check against an already-locked boundary state; used
    /// by both `can_acquire` (read-only) and `try_acquire` (which commits
    /// under the same lock acquisition if this admits).
    fn evaluate(
        id: &StrategyId,
        state: &BoundaryStateInner<ConcurrencyLimitedInfo>,
        boundary: &BoundaryId,
        info: &ConcurrencyLimitedInfo,
    ) -> Verdict {
        let current = state
            .iter()
            .filter(|existing| existing.concurrency_id == info.concurrency_id)
            .count();
        match info.limit {
            ConcurrencyLimit::Unlimited => Verdict::Admit,
            ConcurrencyLimit::Limited(limit) if current < limit => Verdict::Admit,
            ConcurrencyLimit::Limited(limit) => Verdict::Refuse(strategy_error(
                boundary,
                info.action_id(),
                info.unique_id(),
                id,
                StrategyErrorKind::ConcurrencyLimitReached {
                    group: info.concurrency_id.clone(),
                    limit,
                    current,
                },
            )),
        }
    }
}

impl Strategy<ConcurrencyLimitedInfo> for ConcurrencyLimitedStrategy {
    fn can_acquire(&self, boundary: &BoundaryId, info: &ConcurrencyLimitedInfo) -> Verdict {
        self.state
            .with_state(boundary, |state| Self::evaluate(&self.id, state, boundary, info))
    }

    fn acquire(&self, boundary: &BoundaryId, info: &ConcurrencyLimitedInfo) {
        self.state.with_state(boundary, |state| state.push(info.clone()));
        tracing::debug!(strategy = %self.id, action = %info.action_id(), group = %info.concurrency_id, "concurrency-limited lock acquired");
    }

    /// Check and commit under a single hold of the boundary's lock, so two
    /// concurrent arrivals racing the last open slot can never both read the
    /// same under-limit count and both be admitted.
    fn try_acquire(&self, boundary: &BoundaryId, info: &ConcurrencyLimitedInfo) -> Verdict {
        let verdict = self.state.with_state(boundary, |state| {
            let verdict = Self::evaluate(&self.id, state, boundary, info);
            if verdict.is_admit() {
                state.push(info.clone());
            }
            verdict
        });
        if verdict.is_admit() {
            tracing::debug!(strategy = %self.id, action = %info.action_id(), group = %info.concurrency_id, "concurrency-limited lock acquired");
            if crate::config::debug_logging_enabled() {
                tracing::trace!(strategy = %self.id, additional = ?info.debug_additional_info(), "concurrency-limited acquire detail");
            }
        }
        verdict
    }

    fn release(&self, boundary: &BoundaryId, info: &ConcurrencyLimitedInfo) {
        self.state.with_state(boundary, |state| {
            state.remove(info.unique_id());
        });
        tracing::debug!(strategy = %self.id, action = %info.action_id(), "concurrency-limited lock released");
    }

    fn clear_all(&self) {
        self.state.clear_all();
    }

    fn clear(&self, boundary: &BoundaryId) {
        self.state.clear(boundary);
    }

    fn current_locks(&self) -> HashMap<BoundaryId, Vec<ConcurrencyLimitedInfo>> {
        self.state.current_locks()
    }

    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }
}
