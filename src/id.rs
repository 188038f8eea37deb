//! Identifier types: boundaries, actions, strategies, and per-attempt unique ids.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use uuid::Uuid;

/// Bound every type a caller can use as a [`BoundaryId`] payload.
///
/// Blanket-implemented for any hashable, equatable, cloneable, debuggable,
/// thread-safe `'static` value — the core never needs more than that to key
/// per-boundary state.
pub trait BoundaryIdValue: Any + fmt::Debug + Send + Sync {
    #[doc(hidden)]
    fn as_any(&self) -> &dyn Any;
    #[doc(hidden)]
    fn dyn_eq(&self, other: &dyn BoundaryIdValue) -> bool;
    #[doc(hidden)]
    fn dyn_hash(&self, state: &mut dyn Hasher);
    #[doc(hidden)]
    fn dyn_clone(&self) -> Box<dyn BoundaryIdValue>;
}

impl<T> BoundaryIdValue for T
where
    T: Any + Eq + Hash + Clone + fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn BoundaryIdValue) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|o| self == o)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }

    fn dyn_clone(&self) -> Box<dyn BoundaryIdValue> {
        Box::new(self.clone())
    }
}

/// A type-erased, hashable, equatable boundary identifier.
///
/// Two `BoundaryId`s compare equal iff the values wrapped inside them
/// compare equal — the core never inspects the wrapped type itself.
pub struct BoundaryId(Box<dyn BoundaryIdValue>);

impl BoundaryId {
    /// Wrap any eligible value as a boundary identifier.
    pub fn new<T>(value: T) -> Self
    where
        T: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    {
        Self(Box::new(value))
    }

    /// Attempt to recover the original typed value.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl Clone for BoundaryId {
    fn clone(&self) -> Self {
        Self(self.0.dyn_clone())
    }
}

impl PartialEq for BoundaryId {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(other.0.as_ref())
    }
}

impl Eq for BoundaryId {}

impl Hash for BoundaryId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.dyn_hash(state)
    }
}

impl fmt::Debug for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundaryId({:?})", self.0)
    }
}

impl From<String> for BoundaryId {
    fn from(value: String) -> Self {
        BoundaryId::new(value)
    }
}

impl From<&'static str> for BoundaryId {
    fn from(value: &'static str) -> Self {
        BoundaryId::new(value.to_string())
    }
}

/// An opaque, caller-assigned identifier for an action attempting to run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionId(Arc<str>);

impl ActionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::from(value.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionId {
    fn from(value: &str) -> Self {
        ActionId::new(value)
    }
}

impl From<String> for ActionId {
    fn from(value: String) -> Self {
        ActionId::new(value)
    }
}

/// A strategy identifier: a name plus an optional configuration discriminator.
///
/// Its string `value()` is `name` alone, or `name + ":" + configuration` when
/// a configuration is present. Used as the container's registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrategyId {
    name: Arc<str>,
    configuration: Option<Arc<str>>,
}

impl StrategyId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            configuration: None,
        }
    }

    pub fn with_configuration(name: impl Into<String>, configuration: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            configuration: Some(Arc::from(configuration.into())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configuration(&self) -> Option<&str> {
        self.configuration.as_deref()
    }

    /// The registry key string: `name` or `name:configuration`.
    pub fn value(&self) -> String {
        match &self.configuration {
            Some(config) => format!("{}:{}", self.name, config),
            None => self.name.to_string(),
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value())
    }
}

/// A group identifier, shared between [`ConcurrencyLimited`](crate::info::ConcurrencyLimitedInfo)'s
/// `concurrency_id` and [`GroupCoordinated`](crate::info::GroupCoordinatedInfo)'s `group_id`s.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupId(Arc<str>);

impl GroupId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::from(value.into()))
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        GroupId::new(value)
    }
}

/// A fresh, process-unique value minted once per [`LockInfo`](crate::info::LockInfo) instance.
///
/// Backed by a random v4 UUID rather than a counter: info instances are
/// constructed independently across threads and, in tests, across
/// repeatedly-reset scoped containers, so there is no single place to host a
/// monotonic counter that is guaranteed live for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniqueId(Uuid);

impl UniqueId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UniqueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_id_equality_is_by_value() {
        let a = BoundaryId::new("screen-a".to_string());
        let b = BoundaryId::new("screen-a".to_string());
        let c = BoundaryId::new("screen-b".to_string());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn boundary_id_distinct_types_never_equal() {
        let a = BoundaryId::new(1_u32);
        let b = BoundaryId::new("1".to_string());
        assert_ne!(a, b);
    }

    #[test]
    fn strategy_id_value_formatting() {
        let plain = StrategyId::new("singleExecution");
        assert_eq!(plain.value(), "singleExecution");
        let configured = StrategyId::with_configuration("concurrencyLimited", "uploads");
        assert_eq!(configured.value(), "concurrencyLimited:uploads");
    }

    #[test]
    fn unique_ids_never_collide_across_many_constructions() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(UniqueId::new()));
        }
    }
}
