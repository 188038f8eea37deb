//! Process-wide runtime-mutable configuration.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::token::{Executor, ReleaseOption, ThreadExecutor};

/// Process-wide switches consulted by the facade and by release tokens.
///
/// Read through the free functions in this module rather than as raw
/// fields: `issue_reporter` is a boxed closure, not `Copy`, and callers
/// should see one consistent snapshot per read rather than risk tearing
/// across fields taken one at a time.
#[derive(Clone)]
pub struct Config {
    pub default_unlock_option: ReleaseOption,
    pub handle_cancellation_errors: bool,
    pub issue_reporter: Arc<dyn Fn(&str) + Send + Sync>,
    pub debug_logging_enabled: bool,
    pub transition_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_unlock_option: ReleaseOption::Immediate,
            handle_cancellation_errors: false,
            issue_reporter: Arc::new(|message| tracing::warn!(%message, "lockman issue")),
            debug_logging_enabled: false,
            transition_delay: Duration::from_millis(350),
        }
    }
}

static CONFIG: Lazy<RwLock<Config>> = Lazy::new(|| RwLock::new(Config::default()));
static EXECUTOR: Lazy<RwLock<Arc<dyn Executor>>> = Lazy::new(|| RwLock::new(Arc::new(ThreadExecutor)));

/// Replace the whole configuration at once.
pub fn set(new: Config) {
    *CONFIG.write().unwrap() = new;
}

/// Mutate the configuration in place under a single write-lock critical
/// section.
pub fn update(f: impl FnOnce(&mut Config)) {
    let mut guard = CONFIG.write().unwrap();
    f(&mut guard);
}

/// Restore every field to its default, atomically.
pub fn reset() {
    *CONFIG.write().unwrap() = Config::default();
}

/// A consistent snapshot of the current configuration.
pub fn snapshot() -> Config {
    CONFIG.read().unwrap().clone()
}

pub(crate) fn default_unlock_option() -> ReleaseOption {
    CONFIG.read().unwrap().default_unlock_option
}

pub(crate) fn transition_delay() -> Duration {
    CONFIG.read().unwrap().transition_delay
}

pub(crate) fn debug_logging_enabled() -> bool {
    CONFIG.read().unwrap().debug_logging_enabled
}

pub(crate) fn handle_cancellation_errors() -> bool {
    CONFIG.read().unwrap().handle_cancellation_errors
}

/// Route a message through the configured issue reporter (defaults to a
/// `tracing::warn!` sink).
pub(crate) fn report_issue(message: &str) {
    let reporter = CONFIG.read().unwrap().issue_reporter.clone();
    reporter(message);
}

/// Install a custom [`Executor`] (e.g. a `TokioExecutor`) for deferred
/// `UnlockToken` releases. Defaults to [`ThreadExecutor`].
pub fn set_executor(executor: Arc<dyn Executor>) {
    *EXECUTOR.write().unwrap() = executor;
}

pub(crate) fn executor() -> Arc<dyn Executor> {
    EXECUTOR.read().unwrap().clone()
}
