//! Release tokens and the scheduling seam they use for deferred release.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config;
use crate::id::BoundaryId;
use crate::info::LockInfo;
use crate::strategy::ErasedStrategy;

/// When a held lock actually gets released once [`UnlockToken::release`] is
/// invoked (or the token drops).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOption {
    /// Release synchronously, on the calling thread.
    Immediate,
    /// Release on whatever the host's "main thread" executor is configured
    /// to be (in this crate, the configured [`Executor`] with no delay).
    MainThread,
    /// Release after `Config::transition_delay` — for work that hands off
    /// to a UI transition or similar and should outlive it briefly.
    Transition,
    /// Release after a caller-chosen delay.
    Delayed(Duration),
}

/// A scheduling seam so the crate never owns (or assumes) a particular
/// async runtime. The default [`ThreadExecutor`] spawns a short-lived
/// `std::thread`; an opt-in `tokio` feature adds [`TokioExecutor`].
///
/// Cancellation of the *scheduling* must never cancel the release itself —
/// both implementations detach the scheduled job rather than returning a
/// handle a caller could abort.
pub trait Executor: Send + Sync {
    fn schedule(&self, after: Duration, job: Box<dyn FnOnce() + Send>);
}

/// Zero-dependency default: spawns a thread, sleeps for `after`, runs `job`.
pub struct ThreadExecutor;

impl Executor for ThreadExecutor {
    fn schedule(&self, after: Duration, job: Box<dyn FnOnce() + Send>) {
        std::thread::spawn(move || {
            if !after.is_zero() {
                std::thread::sleep(after);
            }
            job();
        });
    }
}

#[cfg(feature = "tokio")]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioExecutor {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }
}

#[cfg(feature = "tokio")]
impl Executor for TokioExecutor {
    fn schedule(&self, after: Duration, job: Box<dyn FnOnce() + Send>) {
        self.handle.spawn(async move {
            if !after.is_zero() {
                tokio::time::sleep(after).await;
            }
            job();
        });
    }
}

struct ReleaseJob {
    boundary: BoundaryId,
    info: Box<dyn LockInfo>,
    strategy: Arc<dyn ErasedStrategy>,
}

impl ReleaseJob {
    fn run(self) {
        self.strategy.release_erased(&self.boundary, self.info.as_ref());
        tracing::debug!(strategy = %self.strategy.strategy_id(), "release job ran");
    }
}

/// A scoped, idempotent handle on a single admitted lock. Releases exactly
/// once, whether via an explicit [`UnlockToken::release`] call or, if the
/// caller never calls it, on drop — unlike a type split between "auto" and
/// "manual" variants, Rust's ownership model already makes "forgot to
/// release" safe by default, so one token type covers both usages.
pub struct UnlockToken {
    job: Mutex<Option<ReleaseJob>>,
    option: ReleaseOption,
    executor: Arc<dyn Executor>,
}

impl UnlockToken {
    pub(crate) fn new(
        boundary: BoundaryId,
        info: Box<dyn LockInfo>,
        strategy: Arc<dyn ErasedStrategy>,
        option: ReleaseOption,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            job: Mutex::new(Some(ReleaseJob { boundary, info, strategy })),
            option,
            executor,
        }
    }

    /// Release the held lock per this token's [`ReleaseOption`]. A second
    /// call (or the eventual drop) is a no-op.
    pub fn release(&self) {
        let Some(job) = self.job.lock().unwrap().take() else {
            return;
        };
        match self.option {
            ReleaseOption::Immediate => job.run(),
            ReleaseOption::MainThread => self.executor.schedule(Duration::ZERO, Box::new(move || job.run())),
            ReleaseOption::Transition => {
                let delay = config::transition_delay();
                self.executor.schedule(delay, Box::new(move || job.run()));
            }
            ReleaseOption::Delayed(delay) => self.executor.schedule(delay, Box::new(move || job.run())),
        }
    }

    pub fn is_released(&self) -> bool {
        self.job.lock().unwrap().is_none()
    }
}

impl Drop for UnlockToken {
    fn drop(&mut self) {
        self.release();
    }
}
