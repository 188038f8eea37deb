//! Error taxonomy: strategy refusals, preceding-cancellation causes, and
//! container registration failures.

use std::fmt;

use crate::id::{ActionId, BoundaryId, GroupId, StrategyId, UniqueId};
use crate::info::Priority;

/// The reason a [`Verdict::Refuse`](crate::verdict::Verdict::Refuse) or the
/// cause carried by a [`Verdict::AdmitWithPreemption`](crate::verdict::Verdict::AdmitWithPreemption)
/// came about. One variant per built-in strategy's refusal/preemption rule.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StrategyErrorKind {
    #[error("boundary already locked by action `{existing_action}`")]
    BoundaryAlreadyLocked {
        existing_action: ActionId,
        existing_unique_id: UniqueId,
    },

    #[error("action `{existing_action}` is already running in this boundary")]
    ActionAlreadyRunning {
        existing_action: ActionId,
        existing_unique_id: UniqueId,
    },

    #[error("priority {attempted:?} is lower than the current holder's {current:?}")]
    PriorityTooLow { attempted: Priority, current: Priority },

    #[error("current priority {current:?} is exclusive and cannot be preempted")]
    PriorityExclusiveConflict { current: Priority },

    #[error("action `{existing_action}` already holds this boundary at an equal, blocking priority")]
    SameActionBlocked {
        existing_action: ActionId,
        existing_unique_id: UniqueId,
    },

    /// Carried inside a [`PrecedingCancellationError`], describing why the
    /// displaced info lost the boundary. Never used as a refuse reason.
    #[error("preempted by action `{by_action}` at priority {by_priority:?}")]
    Preempted {
        by_action: ActionId,
        by_priority: Priority,
    },

    #[error("concurrency limit {limit} reached for group `{group}` (currently {current})")]
    ConcurrencyLimitReached {
        group: GroupId,
        limit: usize,
        current: usize,
    },

    #[error("group `{group}` must be empty for this leader entry policy")]
    GroupNotEmpty { group: GroupId },

    #[error("group `{group}` already has a leader present")]
    GroupLeaderPresent { group: GroupId },

    #[error("group `{group}` already has members present")]
    GroupMembersPresent { group: GroupId },

    #[error("group `{group}` has no leader present for member entry")]
    GroupLeaderAbsent { group: GroupId },

    #[error("dynamic condition refused: {message}")]
    DynamicConditionRefused { message: String },

    #[error("sub-strategy at index {index} of composite refused: {source}")]
    Composite {
        index: usize,
        #[source]
        source: Box<StrategyError>,
    },

    #[error("strategy `{strategy_id}` is not registered in the active container")]
    StrategyNotRegistered { strategy_id: StrategyId },

    /// Defensive: a composite sub-info did not downcast to the type its
    /// adapter was built for. Indicates a `CompositeInfo`/`CompositeStrategy`
    /// built from mismatched parts; should never surface in correct usage.
    #[error("internal: composite sub-info type mismatch for strategy `{strategy_id}`")]
    InternalTypeMismatch { strategy_id: StrategyId },
}

/// Everything needed to reconstruct spec's `lockman_info`: which action, in
/// which boundary, under which strategy, raised this error.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub boundary_id: BoundaryId,
    pub action_id: ActionId,
    pub unique_id: UniqueId,
    pub strategy_id: StrategyId,
}

/// A strategy's refusal (or preemption cause), with enough context attached
/// to log or report without the caller re-deriving it.
#[derive(Debug, Clone)]
pub struct StrategyError {
    pub context: ErrorContext,
    pub kind: StrategyErrorKind,
}

impl StrategyError {
    pub fn new(context: ErrorContext, kind: StrategyErrorKind) -> Self {
        Self { context, kind }
    }
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (action=`{}`, boundary={:?}, strategy=`{}`)",
            self.kind, self.context.action_id, self.context.boundary_id, self.context.strategy_id
        )
    }
}

impl std::error::Error for StrategyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// The cause attached to [`Verdict::AdmitWithPreemption`](crate::verdict::Verdict::AdmitWithPreemption):
/// identifies the info that was displaced to admit the new one.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct PrecedingCancellationError {
    pub error: StrategyError,
    pub displaced_action_id: ActionId,
    pub displaced_unique_id: UniqueId,
}

/// Failures from the [`Container`](crate::container::Container) registry
/// itself — distinct from `Verdict`, since registration is not an admission
/// decision.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistrationError {
    #[error("strategy `{0}` is not registered")]
    NotRegistered(StrategyId),
    #[error("strategy `{0}` is already registered")]
    AlreadyRegistered(StrategyId),
}

pub(crate) fn strategy_error(
    boundary: &BoundaryId,
    action_id: &ActionId,
    unique_id: UniqueId,
    strategy_id: &StrategyId,
    kind: StrategyErrorKind,
) -> StrategyError {
    StrategyError::new(
        ErrorContext {
            boundary_id: boundary.clone(),
            action_id: action_id.clone(),
            unique_id,
            strategy_id: strategy_id.clone(),
        },
        kind,
    )
}
