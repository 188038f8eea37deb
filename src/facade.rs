//! The public entry point: `lock(action, boundary, ...)`.

use crate::config;
use crate::error::{strategy_error, StrategyErrorKind};
use crate::id::BoundaryId;
use crate::info::LockInfo;
use crate::scope;
use crate::strategy::{erase, Strategy};
use crate::token::{ReleaseOption, UnlockToken};
use crate::verdict::Verdict;

/// Something that can attempt to run within a boundary: produces the
/// [`LockInfo`] a strategy arbitrates over, and optionally opts into a
/// non-default [`ReleaseOption`].
pub trait Action: Send + Sync {
    type Info: LockInfo + Clone;

    fn create_info(&self) -> Self::Info;

    fn default_unlock_option(&self) -> Option<ReleaseOption> {
        None
    }
}

/// The outcome of a [`lock`] call: the verdict, the info that was
/// evaluated, and — only on admission — the token that releases it.
pub struct LockResult<I: LockInfo> {
    pub verdict: Verdict,
    pub info: I,
    pub token: Option<UnlockToken>,
}

impl<I: LockInfo> LockResult<I> {
    pub fn is_admit(&self) -> bool {
        self.verdict.is_admit()
    }
}

/// Arbitrate whether `action` may begin executing within `boundary`.
///
/// Steps: construct the action's info, resolve its strategy from the active
/// container (the innermost [`scope`] override, or the process-wide
/// default), call `try_acquire` to check and commit atomically, and on any
/// admitting verdict hand back an [`UnlockToken`] using `unlock_option` (or
/// the action's own default, or
/// [`Config::default_unlock_option`](crate::config::Config)).
///
/// A strategy that isn't registered in the active container is treated as a
/// refusal: the registration gap is reported through
/// [`Config::issue_reporter`](crate::config::Config) *and* surfaced to the
/// caller as `Verdict::Refuse`, rather than silently admitting or panicking.
pub fn lock<A: Action>(action: &A, boundary: impl Into<BoundaryId>, unlock_option: Option<ReleaseOption>) -> LockResult<A::Info> {
    let boundary = boundary.into();
    let info = action.create_info();

    if config::debug_logging_enabled() {
        tracing::trace!(
            action = %info.action_id(),
            strategy = %info.strategy_id(),
            boundary = ?boundary,
            additional = ?info.debug_additional_info(),
            "lock: info constructed"
        );
    }

    let container = scope::current();
    let strategy = match container.resolve::<A::Info>(info.strategy_id()) {
        Ok(strategy) => strategy,
        Err(_) => {
            let message = format!("strategy `{}` is not registered in the active container", info.strategy_id());
            config::report_issue(&message);
            let verdict = Verdict::Refuse(strategy_error(
                &boundary,
                info.action_id(),
                info.unique_id(),
                info.strategy_id(),
                StrategyErrorKind::StrategyNotRegistered {
                    strategy_id: info.strategy_id().clone(),
                },
            ));
            tracing::warn!(strategy = %info.strategy_id(), "lock: strategy not registered");
            return LockResult { verdict, info, token: None };
        }
    };

    // `try_acquire` checks and, on an admitting verdict, commits under one
    // hold of the strategy's per-boundary lock — a separate `can_acquire`
    // followed by `acquire` would leave a window in which a second caller
    // could also observe an admitting verdict for a boundary meant to admit
    // only one holder.
    let verdict = strategy.try_acquire(&boundary, &info);
    tracing::debug!(action = %info.action_id(), admit = verdict.is_admit(), "lock: verdict computed");

    if verdict.is_refuse() {
        return LockResult { verdict, info, token: None };
    }

    let option = unlock_option
        .or_else(|| action.default_unlock_option())
        .unwrap_or_else(config::default_unlock_option);

    let erased = erase::<A::Info, _>(strategy);
    let token = UnlockToken::new(boundary, Box::new(info.clone()), erased, option, config::executor());

    LockResult {
        verdict,
        info,
        token: Some(token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::{ExecutionMode, SingleExecutionInfo};

    struct Upload;

    impl Action for Upload {
        type Info = SingleExecutionInfo;

        fn create_info(&self) -> Self::Info {
            SingleExecutionInfo::new("upload", ExecutionMode::Boundary)
        }
    }

    #[test]
    fn second_attempt_is_refused_until_the_first_releases() {
        let container = scope::fresh_container();
        scope::with_scoped(container, || {
            let boundary = BoundaryId::new("screen".to_string());
            let first = lock(&Upload, boundary.clone(), None);
            assert!(first.is_admit());

            let second = lock(&Upload, boundary.clone(), None);
            assert!(second.verdict.is_refuse());

            first.token.unwrap().release();
            let third = lock(&Upload, boundary, None);
            assert!(third.is_admit());
        });
    }

    #[test]
    fn unregistered_strategy_is_refused_not_panicked() {
        let container = std::sync::Arc::new(crate::container::Container::new());
        scope::with_scoped(container, || {
            let boundary = BoundaryId::new("screen".to_string());
            let result = lock(&Upload, boundary, None);
            assert!(result.verdict.is_refuse());
            assert!(result.token.is_none());
        });
    }
}
