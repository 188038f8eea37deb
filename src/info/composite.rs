use std::any::Any;
use std::fmt;

use super::{LockInfo, LockInfoBase};
use crate::id::{ActionId, StrategyId, UniqueId};

/// Lock info for the `CompositeStrategy<N>` combinator (arity 2..=5): wraps
/// N sub-infos, each belonging to its own strategy, admitted and released
/// together. Its own `strategy_id` is derived from the sub-infos' strategy
/// ids so that a composite built from the same ordered parts always names
/// the same container entry (see `CompositeStrategy::strategy_id`).
pub struct CompositeInfo {
    base: LockInfoBase,
    subs: Vec<Box<dyn LockInfo>>,
}

fn composite_strategy_id(subs: &[Box<dyn LockInfo>]) -> StrategyId {
    let configuration = subs
        .iter()
        .map(|s| s.strategy_id().value())
        .collect::<Vec<_>>()
        .join("+");
    StrategyId::with_configuration(format!("CompositeStrategy<{}>", subs.len()), configuration)
}

impl CompositeInfo {
    fn from_parts(action_id: impl Into<ActionId>, subs: Vec<Box<dyn LockInfo>>) -> Self {
        assert!(
            (2..=5).contains(&subs.len()),
            "CompositeInfo supports arity 2..=5, got {}",
            subs.len()
        );
        let is_cancellation_target = subs.iter().any(|s| s.is_cancellation_target());
        let strategy_id = composite_strategy_id(&subs);
        Self {
            base: LockInfoBase::new(action_id, strategy_id, is_cancellation_target),
            subs,
        }
    }

    pub fn new2(action_id: impl Into<ActionId>, a: impl LockInfo, b: impl LockInfo) -> Self {
        Self::from_parts(action_id, vec![Box::new(a), Box::new(b)])
    }

    pub fn new3(action_id: impl Into<ActionId>, a: impl LockInfo, b: impl LockInfo, c: impl LockInfo) -> Self {
        Self::from_parts(action_id, vec![Box::new(a), Box::new(b), Box::new(c)])
    }

    pub fn new4(
        action_id: impl Into<ActionId>,
        a: impl LockInfo,
        b: impl LockInfo,
        c: impl LockInfo,
        d: impl LockInfo,
    ) -> Self {
        Self::from_parts(action_id, vec![Box::new(a), Box::new(b), Box::new(c), Box::new(d)])
    }

    pub fn new5(
        action_id: impl Into<ActionId>,
        a: impl LockInfo,
        b: impl LockInfo,
        c: impl LockInfo,
        d: impl LockInfo,
        e: impl LockInfo,
    ) -> Self {
        Self::from_parts(
            action_id,
            vec![Box::new(a), Box::new(b), Box::new(c), Box::new(d), Box::new(e)],
        )
    }

    pub fn subs(&self) -> &[Box<dyn LockInfo>] {
        &self.subs
    }
}

impl Clone for CompositeInfo {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            subs: self.subs.iter().map(|s| s.clone_box()).collect(),
        }
    }
}

impl fmt::Debug for CompositeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeInfo")
            .field("action_id", &self.base.action_id)
            .field("subs", &self.subs)
            .finish()
    }
}

impl LockInfo for CompositeInfo {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn action_id(&self) -> &ActionId {
        &self.base.action_id
    }

    fn unique_id(&self) -> UniqueId {
        self.base.unique_id
    }

    fn strategy_id(&self) -> &StrategyId {
        &self.base.strategy_id
    }

    fn is_cancellation_target(&self) -> bool {
        self.base.is_cancellation_target
    }

    fn debug_description(&self) -> String {
        format!(
            "Composite(action=`{}`, arity={}, strategy=`{}`)",
            self.base.action_id,
            self.subs.len(),
            self.base.strategy_id
        )
    }

    fn debug_additional_info(&self) -> Option<String> {
        let parts: Vec<String> = self.subs.iter().filter_map(|s| s.debug_additional_info()).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }

    fn clone_box(&self) -> Box<dyn LockInfo> {
        Box::new(self.clone())
    }
}
