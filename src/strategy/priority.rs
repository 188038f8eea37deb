use std::collections::HashMap;

use super::Strategy;
use crate::error::{strategy_error, StrategyErrorKind};
use crate::id::{BoundaryId, StrategyId};
use crate::info::{PriorityBehavior, PriorityInfo};
use crate::state::{BoundaryStateInner, BoundaryStateStore};
use crate::verdict::Verdict;

/// The only built-in strategy that ever preempts: a higher (or, depending on
/// behavior, equal) priority arrival may displace the current highest
/// holder.
///
/// Algorithm, applied against the current highest-priority holder `cur`
/// (ties broken toward the most recently inserted):
/// 1. No existing holder → admit.
/// 2. `info.priority < cur.priority` → refuse (too low to contend at all).
/// 3. `info.priority > cur.priority` → `cur.priority`'s behavior decides:
///    `Exclusive` refuses, `Replaceable` admits-with-preemption of `cur`.
/// 4. Equal priority, `Priority::None` → admit (none never blocks, never
///    preempts).
/// 5. Equal priority, same action id, `blocks_same_action` → refuse.
/// 6. Equal priority otherwise → `cur.priority`'s behavior decides, same as
///    step 3.
pub struct PriorityStrategy {
    state: BoundaryStateStore<PriorityInfo>,
    id: StrategyId,
}

impl PriorityStrategy {
    pub fn new() -> Self {
        Self {
            state: BoundaryStateStore::new(),
            id: StrategyId::new("priorityBased"),
        }
    }
}

impl Default for PriorityStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityStrategy {
    /// Pure admission check against an already-locked boundary state; used
    /// by both `can_acquire` (read-only) and `try_acquire` (which commits
    /// under the same lock acquisition if this admits).
    fn evaluate(
        id: &StrategyId,
        state: &BoundaryStateInner<PriorityInfo>,
        boundary: &BoundaryId,
        info: &PriorityInfo,
    ) -> Verdict {
        // `Priority::None` holders never block and are invisible to this
        // comparison; only a non-`None` holder can refuse or be preempted.
        let current = state
            .iter()
            .filter(|candidate| candidate.priority != crate::info::Priority::None)
            .fold(None::<&PriorityInfo>, |best, candidate| match best {
                None => Some(candidate),
                Some(best) if candidate.priority >= best.priority => Some(candidate),
                Some(best) => Some(best),
            });

        let Some(current) = current else {
            return Verdict::Admit;
        };

        if info.priority < current.priority {
            return Verdict::Refuse(strategy_error(
                boundary,
                info.action_id(),
                info.unique_id(),
                id,
                StrategyErrorKind::PriorityTooLow {
                    attempted: info.priority,
                    current: current.priority,
                },
            ));
        }

        if info.priority == current.priority {
            if info.priority == crate::info::Priority::None {
                return Verdict::Admit;
            }
            if info.blocks_same_action && current.action_id() == info.action_id() {
                return Verdict::Refuse(strategy_error(
                    boundary,
                    info.action_id(),
                    info.unique_id(),
                    id,
                    StrategyErrorKind::SameActionBlocked {
                        existing_action: current.action_id().clone(),
                        existing_unique_id: current.unique_id(),
                    },
                ));
            }
        }

        // info.priority > current.priority, or an equal-priority arrival
        // that wasn't refused above: current's own behavior decides.
        match current.priority.behavior() {
            Some(PriorityBehavior::Replaceable) => {
                Verdict::AdmitWithPreemption(crate::error::PrecedingCancellationError {
                    error: strategy_error(
                        boundary,
                        current.action_id(),
                        current.unique_id(),
                        id,
                        StrategyErrorKind::Preempted {
                            by_action: info.action_id().clone(),
                            by_priority: info.priority,
                        },
                    ),
                    displaced_action_id: current.action_id().clone(),
                    displaced_unique_id: current.unique_id(),
                })
            }
            Some(PriorityBehavior::Exclusive) | None => Verdict::Refuse(strategy_error(
                boundary,
                info.action_id(),
                info.unique_id(),
                id,
                StrategyErrorKind::PriorityExclusiveConflict {
                    current: current.priority,
                },
            )),
        }
    }

    /// Evict whichever holder `info` displaces (if any) and push `info`.
    /// Shared by `acquire` and `try_acquire` so the displacement logic
    /// isn't duplicated between the two commit paths.
    fn commit(state: &mut BoundaryStateInner<PriorityInfo>, info: &PriorityInfo) {
        let displaced = if info.priority == crate::info::Priority::None {
            None
        } else {
            state
                .iter()
                .filter(|existing| existing.priority != crate::info::Priority::None)
                .max_by_key(|existing| existing.priority)
                .map(|existing| existing.unique_id())
        };
        if let Some(unique_id) = displaced {
            state.remove(unique_id);
        }
        state.push(info.clone());
    }
}

impl Strategy<PriorityInfo> for PriorityStrategy {
    fn can_acquire(&self, boundary: &BoundaryId, info: &PriorityInfo) -> Verdict {
        self.state
            .with_state(boundary, |state| Self::evaluate(&self.id, state, boundary, info))
    }

    fn acquire(&self, boundary: &BoundaryId, info: &PriorityInfo) {
        self.state.with_state(boundary, |state| Self::commit(state, info));
        tracing::debug!(strategy = %self.id, action = %info.action_id(), priority = ?info.priority, "priority lock acquired");
    }

    /// Check and commit under a single hold of the boundary's lock, so a
    /// preempting arrival can never race another caller observing the same
    /// stale top-priority holder.
    fn try_acquire(&self, boundary: &BoundaryId, info: &PriorityInfo) -> Verdict {
        let verdict = self.state.with_state(boundary, |state| {
            let verdict = Self::evaluate(&self.id, state, boundary, info);
            if verdict.is_admit() {
                Self::commit(state, info);
            }
            verdict
        });
        if verdict.is_admit() {
            tracing::debug!(strategy = %self.id, action = %info.action_id(), priority = ?info.priority, "priority lock acquired");
            if crate::config::debug_logging_enabled() {
                tracing::trace!(strategy = %self.id, additional = ?info.debug_additional_info(), "priority lock acquire detail");
            }
        }
        verdict
    }

    fn release(&self, boundary: &BoundaryId, info: &PriorityInfo) {
        self.state.with_state(boundary, |state| {
            state.remove(info.unique_id());
        });
        tracing::debug!(strategy = %self.id, action = %info.action_id(), "priority lock released");
    }

    fn clear_all(&self) {
        self.state.clear_all();
    }

    fn clear(&self, boundary: &BoundaryId) {
        self.state.clear(boundary);
    }

    fn current_locks(&self) -> HashMap<BoundaryId, Vec<PriorityInfo>> {
        self.state.current_locks()
    }

    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::Priority;

    #[test]
    fn higher_replaceable_priority_preempts() {
        let strategy = PriorityStrategy::new();
        let boundary = BoundaryId::new("screen".to_string());
        let low = PriorityInfo::new("low", Priority::Low(PriorityBehavior::Replaceable), false);
        strategy.acquire(&boundary, &low);

        let high = PriorityInfo::new("high", Priority::High(PriorityBehavior::Exclusive), false);
        let verdict = strategy.can_acquire(&boundary, &high);
        assert!(matches!(verdict, Verdict::AdmitWithPreemption(_)));
    }

    #[test]
    fn exclusive_priority_refuses_equal_or_higher() {
        let strategy = PriorityStrategy::new();
        let boundary = BoundaryId::new("screen".to_string());
        let high = PriorityInfo::new("high", Priority::High(PriorityBehavior::Exclusive), false);
        strategy.acquire(&boundary, &high);

        let other = PriorityInfo::new("other", Priority::High(PriorityBehavior::Exclusive), false);
        assert!(strategy.can_acquire(&boundary, &other).is_refuse());
    }

    #[test]
    fn lower_priority_is_always_refused() {
        let strategy = PriorityStrategy::new();
        let boundary = BoundaryId::new("screen".to_string());
        let high = PriorityInfo::new("high", Priority::High(PriorityBehavior::Replaceable), false);
        strategy.acquire(&boundary, &high);

        let low = PriorityInfo::new("low", Priority::Low(PriorityBehavior::Exclusive), false);
        assert!(strategy.can_acquire(&boundary, &low).is_refuse());
    }

    #[test]
    fn acquire_after_preemption_drops_the_displaced_holder() {
        let strategy = PriorityStrategy::new();
        let boundary = BoundaryId::new("screen".to_string());
        let low = PriorityInfo::new("low", Priority::Low(PriorityBehavior::Replaceable), false);
        strategy.acquire(&boundary, &low);

        let high = PriorityInfo::new("high", Priority::High(PriorityBehavior::Exclusive), false);
        strategy.acquire(&boundary, &high);

        let locks = strategy.current_locks();
        let holders = &locks[&boundary];
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].action_id().as_str(), "high");
    }
}
