//! Thread-local override stack letting a caller (typically a test) swap in a
//! fresh [`Container`] for the duration of a closure, without touching the
//! process-wide default.

use std::cell::RefCell;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::container::Container;
use crate::strategy::{
    ConcurrencyLimitedStrategy, DynamicConditionStrategy, GroupCoordinationStrategy, PriorityStrategy,
    SingleExecutionStrategy,
};

static DEFAULT_CONTAINER: Lazy<Arc<Container>> = Lazy::new(|| {
    let container = Arc::new(Container::new());
    register_builtins(&container);
    container
});

fn register_builtins(container: &Container) {
    container
        .register::<crate::info::SingleExecutionInfo, _>(SingleExecutionStrategy::new())
        .expect("builtin strategy registration cannot conflict on a fresh container");
    container
        .register::<crate::info::PriorityInfo, _>(PriorityStrategy::new())
        .expect("builtin strategy registration cannot conflict on a fresh container");
    container
        .register::<crate::info::ConcurrencyLimitedInfo, _>(ConcurrencyLimitedStrategy::new())
        .expect("builtin strategy registration cannot conflict on a fresh container");
    container
        .register::<crate::info::GroupCoordinatedInfo, _>(GroupCoordinationStrategy::new())
        .expect("builtin strategy registration cannot conflict on a fresh container");
    container
        .register::<crate::info::DynamicConditionInfo, _>(DynamicConditionStrategy::new())
        .expect("builtin strategy registration cannot conflict on a fresh container");
}

thread_local! {
    static CONTAINER_STACK: RefCell<Vec<Arc<Container>>> = const { RefCell::new(Vec::new()) };
}

/// Pops its container off the thread-local stack on drop — including on
/// unwind, so a panicking test still restores the previous (or default)
/// container for whatever runs next on this thread.
pub struct ScopedContainerGuard {
    _private: (),
}

impl Drop for ScopedContainerGuard {
    fn drop(&mut self) {
        CONTAINER_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Build a fresh container with the five built-in strategies pre-registered
/// (mirroring the default container), ready to customize further.
pub fn fresh_container() -> Arc<Container> {
    let container = Arc::new(Container::new());
    register_builtins(&container);
    container
}

/// Push `container` as the active container for this thread until the
/// returned guard drops.
pub fn push_scoped(container: Arc<Container>) -> ScopedContainerGuard {
    CONTAINER_STACK.with(|stack| stack.borrow_mut().push(container));
    ScopedContainerGuard { _private: () }
}

/// Run `f` with `container` active on this thread.
pub fn with_scoped<R>(container: Arc<Container>, f: impl FnOnce() -> R) -> R {
    let _guard = push_scoped(container);
    f()
}

/// The container the facade should use: the innermost scoped override if
/// any is active on this thread, else the process-wide default.
pub fn current() -> Arc<Container> {
    CONTAINER_STACK
        .with(|stack| stack.borrow().last().cloned())
        .unwrap_or_else(|| DEFAULT_CONTAINER.clone())
}

/// The process-wide default container (all five built-ins registered).
pub fn default_container() -> Arc<Container> {
    DEFAULT_CONTAINER.clone()
}
