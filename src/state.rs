//! Per-(strategy, boundary) ordered lock state.
//!
//! Each built-in strategy owns one [`BoundaryStateStore`], keyed by
//! [`BoundaryId`] via a [`DashMap`] so distinct boundaries never contend with
//! each other. Within a single boundary, a plain [`Mutex`] keeps the ordered
//! sequence and the action-id index in lockstep — removal by unique id is
//! `O(n)` in the boundary's current holder count, which in exchange keeps
//! the data structure simple and keeps insertion order exact without any
//! position bookkeeping to maintain across removals.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use dashmap::DashMap;

use crate::id::{ActionId, BoundaryId, UniqueId};
use crate::info::LockInfo;

pub(crate) struct BoundaryStateInner<I> {
    sequence: VecDeque<I>,
    index: HashMap<ActionId, Vec<UniqueId>>,
}

impl<I: LockInfo + Clone> BoundaryStateInner<I> {
    fn new() -> Self {
        Self {
            sequence: VecDeque::new(),
            index: HashMap::new(),
        }
    }

    pub(crate) fn push(&mut self, info: I) {
        self.index.entry(info.action_id().clone()).or_default().push(info.unique_id());
        self.sequence.push_back(info);
    }

    pub(crate) fn remove(&mut self, unique_id: UniqueId) -> Option<I> {
        let position = self.sequence.iter().position(|info| info.unique_id() == unique_id)?;
        let removed = self.sequence.remove(position)?;
        if let Some(ids) = self.index.get_mut(removed.action_id()) {
            ids.retain(|id| *id != unique_id);
            if ids.is_empty() {
                self.index.remove(removed.action_id());
            }
        }
        Some(removed)
    }

    pub(crate) fn contains_action(&self, action_id: &ActionId) -> bool {
        self.index.contains_key(action_id)
    }

    pub(crate) fn count_action(&self, action_id: &ActionId) -> usize {
        self.index.get(action_id).map_or(0, Vec::len)
    }

    pub(crate) fn currents(&self, action_id: &ActionId) -> Vec<I> {
        self.sequence
            .iter()
            .filter(|info| info.action_id() == action_id)
            .cloned()
            .collect()
    }

    pub(crate) fn oldest(&self) -> Option<&I> {
        self.sequence.front()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &I> {
        self.sequence.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.sequence.len()
    }

    pub(crate) fn snapshot(&self) -> Vec<I> {
        self.sequence.iter().cloned().collect()
    }

    pub(crate) fn clear(&mut self) {
        self.sequence.clear();
        self.index.clear();
    }
}

/// Owns one [`BoundaryStateInner`] per boundary a strategy has seen.
pub(crate) struct BoundaryStateStore<I> {
    boundaries: DashMap<BoundaryId, Mutex<BoundaryStateInner<I>>>,
}

impl<I: LockInfo + Clone> BoundaryStateStore<I> {
    pub(crate) fn new() -> Self {
        Self {
            boundaries: DashMap::new(),
        }
    }

    /// Run `f` against the (possibly freshly-created) state for `boundary`,
    /// holding that boundary's mutex for the duration. Distinct boundaries
    /// never block each other here.
    pub(crate) fn with_state<R>(&self, boundary: &BoundaryId, f: impl FnOnce(&mut BoundaryStateInner<I>) -> R) -> R {
        let entry = self
            .boundaries
            .entry(boundary.clone())
            .or_insert_with(|| Mutex::new(BoundaryStateInner::new()));
        let mut guard = entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub(crate) fn clear_all(&self) {
        self.boundaries.clear();
    }

    pub(crate) fn clear(&self, boundary: &BoundaryId) {
        if let Some(entry) = self.boundaries.get(boundary) {
            let mut guard = entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.clear();
        }
    }

    pub(crate) fn current_locks(&self) -> HashMap<BoundaryId, Vec<I>> {
        self.boundaries
            .iter()
            .filter_map(|entry| {
                let guard = entry.value().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                let snapshot = guard.snapshot();
                if snapshot.is_empty() {
                    None
                } else {
                    Some((entry.key().clone(), snapshot))
                }
            })
            .collect()
    }
}
