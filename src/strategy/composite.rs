use std::collections::HashMap;
use std::sync::Arc;

use super::{ErasedStrategy, Strategy};
use crate::error::{strategy_error, StrategyErrorKind};
use crate::id::{BoundaryId, StrategyId};
use crate::info::CompositeInfo;
use crate::state::BoundaryStateStore;
use crate::verdict::Verdict;

/// Sequences 2 to 5 sub-strategies as a single admission unit.
///
/// `can_acquire` runs every sub-strategy's `can_acquire` in order: the first
/// refusal fails the whole composite fast, wrapping the sub's error with its
/// index; preemptions are coalesced and the first one encountered wins.
/// `acquire` re-validates each sub immediately before acquiring it and rolls
/// back (in reverse, LIFO) everything already acquired if a sub's admission
/// has changed out from under it since `can_acquire` — this should not
/// happen under the strategy contract, but composite compositions are
/// exercised under adversarial tests precisely because sequencing several
/// strategies together is where that contract is easiest to violate by
/// accident.
pub struct CompositeStrategy {
    subs: Vec<Arc<dyn ErasedStrategy>>,
    own_state: BoundaryStateStore<CompositeInfo>,
    id: StrategyId,
}

impl CompositeStrategy {
    pub fn new(subs: Vec<Arc<dyn ErasedStrategy>>) -> Self {
        assert!(
            (2..=5).contains(&subs.len()),
            "CompositeStrategy supports arity 2..=5, got {}",
            subs.len()
        );
        let configuration = subs.iter().map(|s| s.strategy_id().value()).collect::<Vec<_>>().join("+");
        let id = StrategyId::with_configuration(format!("CompositeStrategy<{}>", subs.len()), configuration);
        Self {
            subs,
            own_state: BoundaryStateStore::new(),
            id,
        }
    }
}

impl Strategy<CompositeInfo> for CompositeStrategy {
    fn can_acquire(&self, boundary: &BoundaryId, info: &CompositeInfo) -> Verdict {
        let mut first_preemption = None;
        for (index, (sub, sub_info)) in self.subs.iter().zip(info.subs().iter()).enumerate() {
            match sub.can_acquire_erased(boundary, sub_info.as_ref()) {
                Verdict::Admit => {}
                Verdict::AdmitWithPreemption(cause) => {
                    if first_preemption.is_none() {
                        first_preemption = Some(cause);
                    }
                }
                Verdict::Refuse(source) => {
                    return Verdict::Refuse(strategy_error(
                        boundary,
                        info.action_id(),
                        info.unique_id(),
                        &self.id,
                        StrategyErrorKind::Composite {
                            index,
                            source: Box::new(source),
                        },
                    ));
                }
            }
        }
        match first_preemption {
            Some(cause) => Verdict::AdmitWithPreemption(cause),
            None => Verdict::Admit,
        }
    }

    fn acquire(&self, boundary: &BoundaryId, info: &CompositeInfo) {
        let mut acquired = Vec::with_capacity(self.subs.len());
        for (index, (sub, sub_info)) in self.subs.iter().zip(info.subs().iter()).enumerate() {
            if matches!(sub.can_acquire_erased(boundary, sub_info.as_ref()), Verdict::Refuse(_)) {
                tracing::warn!(
                    strategy = %self.id,
                    step = index,
                    "composite acquire: admission changed since can_acquire, rolling back"
                );
                for &rollback_index in acquired.iter().rev() {
                    let (rollback_sub, rollback_info): (&Arc<dyn ErasedStrategy>, _) =
                        (&self.subs[rollback_index], &info.subs()[rollback_index]);
                    rollback_sub.release_erased(boundary, rollback_info.as_ref());
                }
                return;
            }
            sub.acquire_erased(boundary, sub_info.as_ref());
            acquired.push(index);
        }
        self.own_state.with_state(boundary, |state| state.push(info.clone()));
        tracing::debug!(strategy = %self.id, action = %info.action_id(), "composite lock acquired");
    }

    /// Check and commit each sub under its own single lock acquisition via
    /// `try_acquire_erased`, instead of composite's own
    /// check-then-re-validate-then-commit dance: a sub that would otherwise
    /// be re-validated between `can_acquire` and `acquire` (and could in
    /// principle lose a race to a concurrent caller in that window) is
    /// instead checked and committed atomically by the time this loop moves
    /// on to the next sub. A refusal partway through rolls back every sub
    /// already committed, in reverse (LIFO) order.
    fn try_acquire(&self, boundary: &BoundaryId, info: &CompositeInfo) -> Verdict {
        let mut committed = Vec::with_capacity(self.subs.len());
        let mut first_preemption = None;
        for (index, (sub, sub_info)) in self.subs.iter().zip(info.subs().iter()).enumerate() {
            match sub.try_acquire_erased(boundary, sub_info.as_ref()) {
                Verdict::Admit => {
                    committed.push(index);
                }
                Verdict::AdmitWithPreemption(cause) => {
                    committed.push(index);
                    if first_preemption.is_none() {
                        first_preemption = Some(cause);
                    }
                }
                Verdict::Refuse(source) => {
                    for &rollback_index in committed.iter().rev() {
                        let (rollback_sub, rollback_info): (&Arc<dyn ErasedStrategy>, _) =
                            (&self.subs[rollback_index], &info.subs()[rollback_index]);
                        rollback_sub.release_erased(boundary, rollback_info.as_ref());
                    }
                    return Verdict::Refuse(strategy_error(
                        boundary,
                        info.action_id(),
                        info.unique_id(),
                        &self.id,
                        StrategyErrorKind::Composite {
                            index,
                            source: Box::new(source),
                        },
                    ));
                }
            }
        }
        self.own_state.with_state(boundary, |state| state.push(info.clone()));
        tracing::debug!(strategy = %self.id, action = %info.action_id(), "composite lock acquired");
        if crate::config::debug_logging_enabled() {
            tracing::trace!(strategy = %self.id, additional = ?info.debug_additional_info(), "composite acquire detail");
        }
        match first_preemption {
            Some(cause) => Verdict::AdmitWithPreemption(cause),
            None => Verdict::Admit,
        }
    }

    fn release(&self, boundary: &BoundaryId, info: &CompositeInfo) {
        for (sub, sub_info) in self.subs.iter().zip(info.subs().iter()).rev() {
            sub.release_erased(boundary, sub_info.as_ref());
        }
        self.own_state.with_state(boundary, |state| {
            state.remove(info.unique_id());
        });
        tracing::debug!(strategy = %self.id, action = %info.action_id(), "composite lock released");
    }

    fn clear_all(&self) {
        self.own_state.clear_all();
        for sub in &self.subs {
            sub.clear_all_erased();
        }
    }

    fn clear(&self, boundary: &BoundaryId) {
        self.own_state.clear(boundary);
        for sub in &self.subs {
            sub.clear_erased(boundary);
        }
    }

    fn current_locks(&self) -> HashMap<BoundaryId, Vec<CompositeInfo>> {
        self.own_state.current_locks()
    }

    fn strategy_id(&self) -> StrategyId {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{ExecutionMode, SingleExecutionInfo};
    use crate::strategy::{erase, SingleExecutionStrategy};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn refusal_from_any_sub_fails_the_whole_composite() {
        let boundary_only = Arc::new(SingleExecutionStrategy::new());
        let action_only = Arc::new(SingleExecutionStrategy::new());
        let composite = CompositeStrategy::new(vec![
            erase::<SingleExecutionInfo, _>(boundary_only.clone()),
            erase::<SingleExecutionInfo, _>(action_only.clone()),
        ]);
        let boundary = BoundaryId::new("screen".to_string());

        let first = CompositeInfo::new2(
            "a",
            SingleExecutionInfo::new("a", ExecutionMode::Boundary),
            SingleExecutionInfo::new("a", ExecutionMode::Action),
        );
        assert!(composite.can_acquire(&boundary, &first).is_admit());
        composite.acquire(&boundary, &first);

        let second = CompositeInfo::new2(
            "b",
            SingleExecutionInfo::new("b", ExecutionMode::Boundary),
            SingleExecutionInfo::new("b", ExecutionMode::Action),
        );
        assert!(composite.can_acquire(&boundary, &second).is_refuse());
    }

    #[test]
    fn release_is_lifo_across_subs() {
        let a = Arc::new(SingleExecutionStrategy::new());
        let b = Arc::new(SingleExecutionStrategy::new());
        let composite = CompositeStrategy::new(vec![
            erase::<SingleExecutionInfo, _>(a.clone()),
            erase::<SingleExecutionInfo, _>(b.clone()),
        ]);
        let boundary = BoundaryId::new("screen".to_string());

        let info = CompositeInfo::new2(
            "a",
            SingleExecutionInfo::new("a", ExecutionMode::Boundary),
            SingleExecutionInfo::new("a", ExecutionMode::Boundary),
        );
        composite.acquire(&boundary, &info);
        assert_eq!(composite.current_locks()[&boundary].len(), 1);
        composite.release(&boundary, &info);
        assert!(composite.current_locks().get(&boundary).is_none());
    }

    /// A test double whose `can_acquire` lies on its second invocation,
    /// admitting at `can_acquire` time but refusing by the time `acquire`
    /// re-validates — used to exercise composite's rollback path.
    struct FlakyStrategy {
        calls: AtomicUsize,
        id: StrategyId,
    }

    impl Strategy<SingleExecutionInfo> for FlakyStrategy {
        fn can_acquire(&self, boundary: &BoundaryId, info: &SingleExecutionInfo) -> Verdict {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Verdict::Admit
            } else {
                Verdict::Refuse(strategy_error(
                    boundary,
                    info.action_id(),
                    info.unique_id(),
                    &self.id,
                    StrategyErrorKind::BoundaryAlreadyLocked {
                        existing_action: info.action_id().clone(),
                        existing_unique_id: info.unique_id(),
                    },
                ))
            }
        }
        fn acquire(&self, _boundary: &BoundaryId, _info: &SingleExecutionInfo) {}
        fn release(&self, _boundary: &BoundaryId, _info: &SingleExecutionInfo) {}
        fn clear_all(&self) {}
        fn clear(&self, _boundary: &BoundaryId) {}
        fn current_locks(&self) -> HashMap<BoundaryId, Vec<SingleExecutionInfo>> {
            HashMap::new()
        }
        fn strategy_id(&self) -> StrategyId {
            self.id.clone()
        }
    }

    #[test]
    fn acquire_rolls_back_when_a_later_sub_changed_its_mind() {
        let first = Arc::new(SingleExecutionStrategy::new());
        let flaky = Arc::new(FlakyStrategy {
            calls: AtomicUsize::new(0),
            id: StrategyId::new("flaky"),
        });
        let composite = CompositeStrategy::new(vec![
            erase::<SingleExecutionInfo, _>(first.clone()),
            erase::<SingleExecutionInfo, _>(flaky),
        ]);
        let boundary = BoundaryId::new("screen".to_string());

        let info = CompositeInfo::new2(
            "a",
            SingleExecutionInfo::new("a", ExecutionMode::Boundary),
            SingleExecutionInfo::new("a", ExecutionMode::Boundary),
        );
        // Consume the flaky sub's one "truthful" admit here, so the
        // re-validation inside `acquire` below observes its lie.
        assert!(composite.can_acquire(&boundary, &info).is_admit());
        composite.acquire(&boundary, &info);

        // first's sub-strategy must have been rolled back: it admits again.
        assert!(first
            .can_acquire(&boundary, &SingleExecutionInfo::new("b", ExecutionMode::Boundary))
            .is_admit());
    }
}
