//! Process-wide registry mapping a [`StrategyId`] to the strategy instance
//! that handles it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::error::RegistrationError;
use crate::id::{BoundaryId, StrategyId};
use crate::info::LockInfo;
use crate::strategy::{register_strategy, RegisteredStrategy, Strategy};

/// A strategy plus its generic parameter, packaged so several can be
/// installed into a [`Container`] atomically via `register_all` without the
/// caller needing to name a single common type for them.
pub struct Registration {
    id: StrategyId,
    entry: RegisteredStrategy,
}

impl Registration {
    pub fn new<I, S>(strategy: S) -> Self
    where
        I: LockInfo,
        S: Strategy<I> + 'static,
    {
        let entry = register_strategy::<I, S>(strategy);
        let id = entry.ops.strategy_id();
        Self { id, entry }
    }
}

/// The process-wide (or scoped-override) strategy registry.
///
/// Readers never block each other; `register`/`register_all` take the
/// single write lock for the duration of validation-plus-install, so a
/// failed `register_all` never leaves a partial set of strategies behind.
pub struct Container {
    strategies: RwLock<HashMap<StrategyId, RegisteredStrategy>>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            strategies: RwLock::new(HashMap::new()),
        }
    }

    pub fn register<I, S>(&self, strategy: S) -> Result<(), RegistrationError>
    where
        I: LockInfo,
        S: Strategy<I> + 'static,
    {
        self.register_all(vec![Registration::new::<I, S>(strategy)])
    }

    /// Install every registration, or none: ids are validated for
    /// uniqueness (both within `registrations` and against the current
    /// registry) before any entry is inserted.
    pub fn register_all(&self, registrations: Vec<Registration>) -> Result<(), RegistrationError> {
        let mut seen = HashSet::with_capacity(registrations.len());
        for registration in &registrations {
            if !seen.insert(registration.id.clone()) {
                return Err(RegistrationError::AlreadyRegistered(registration.id.clone()));
            }
        }

        let mut strategies = self.strategies.write().unwrap();
        for registration in &registrations {
            if strategies.contains_key(&registration.id) {
                return Err(RegistrationError::AlreadyRegistered(registration.id.clone()));
            }
        }
        for registration in registrations {
            tracing::debug!(strategy = %registration.id, "strategy registered");
            strategies.insert(registration.id, registration.entry);
        }
        Ok(())
    }

    pub fn resolve<I: LockInfo>(&self, id: &StrategyId) -> Result<Arc<dyn Strategy<I> + Send + Sync>, RegistrationError> {
        let strategies = self.strategies.read().unwrap();
        let entry = strategies
            .get(id)
            .ok_or_else(|| RegistrationError::NotRegistered(id.clone()))?;
        entry
            .any
            .downcast_ref::<Arc<dyn Strategy<I> + Send + Sync>>()
            .cloned()
            .ok_or_else(|| RegistrationError::NotRegistered(id.clone()))
    }

    pub fn is_registered(&self, id: &StrategyId) -> bool {
        self.strategies.read().unwrap().contains_key(id)
    }

    pub fn clear_all(&self) {
        let strategies = self.strategies.read().unwrap();
        for entry in strategies.values() {
            entry.ops.clear_all();
        }
    }

    pub fn clear(&self, boundary: &BoundaryId) {
        let strategies = self.strategies.read().unwrap();
        for entry in strategies.values() {
            entry.ops.clear(boundary);
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::BoundaryId;
    use crate::info::{ExecutionMode, SingleExecutionInfo};
    use crate::strategy::SingleExecutionStrategy;

    #[test]
    fn register_then_resolve_roundtrips() {
        let container = Container::new();
        let id = StrategyId::new("singleExecution");
        container
            .register::<SingleExecutionInfo, _>(SingleExecutionStrategy::new())
            .unwrap();
        assert!(container.is_registered(&id));
        let resolved = container.resolve::<SingleExecutionInfo>(&id).unwrap();
        let boundary = BoundaryId::new("b".to_string());
        let info = SingleExecutionInfo::new("a", ExecutionMode::None);
        assert!(resolved.can_acquire(&boundary, &info).is_admit());
    }

    #[test]
    fn double_registration_is_rejected() {
        let container = Container::new();
        container
            .register::<SingleExecutionInfo, _>(SingleExecutionStrategy::new())
            .unwrap();
        let err = container
            .register::<SingleExecutionInfo, _>(SingleExecutionStrategy::new())
            .unwrap_err();
        assert!(matches!(err, RegistrationError::AlreadyRegistered(_)));
    }

    #[test]
    fn resolve_of_unregistered_strategy_fails() {
        let container = Container::new();
        let err = container
            .resolve::<SingleExecutionInfo>(&StrategyId::new("missing"))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::NotRegistered(_)));
    }

    #[test]
    fn register_all_is_atomic_on_conflict() {
        let container = Container::new();
        container
            .register::<SingleExecutionInfo, _>(SingleExecutionStrategy::new())
            .unwrap();

        let batch = vec![
            Registration::new::<SingleExecutionInfo, _>(SingleExecutionStrategy::new()),
            Registration::new::<crate::info::PriorityInfo, _>(crate::strategy::PriorityStrategy::new()),
        ];
        let err = container.register_all(batch).unwrap_err();
        assert!(matches!(err, RegistrationError::AlreadyRegistered(_)));
        // The second entry (priorityBased) must not have been installed either.
        assert!(!container.is_registered(&StrategyId::new("priorityBased")));
    }
}
