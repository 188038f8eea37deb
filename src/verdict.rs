//! The three-way admission decision returned by [`crate::facade::lock`].

use crate::error::{PrecedingCancellationError, StrategyError};

/// Whether an action may begin executing in a boundary.
#[derive(Debug, Clone)]
pub enum Verdict {
    /// The boundary was free (or the strategy otherwise has no objection).
    Admit,
    /// Admitted, but only after displacing an existing holder. `0` names
    /// what was displaced and why.
    AdmitWithPreemption(PrecedingCancellationError),
    /// Refused; the action must not proceed.
    Refuse(StrategyError),
}

impl Verdict {
    pub fn is_admit(&self) -> bool {
        matches!(self, Verdict::Admit | Verdict::AdmitWithPreemption(_))
    }

    pub fn is_refuse(&self) -> bool {
        matches!(self, Verdict::Refuse(_))
    }

    pub fn preemption_cause(&self) -> Option<&PrecedingCancellationError> {
        match self {
            Verdict::AdmitWithPreemption(cause) => Some(cause),
            _ => None,
        }
    }

    pub fn refusal(&self) -> Option<&StrategyError> {
        match self {
            Verdict::Refuse(error) => Some(error),
            _ => None,
        }
    }
}
