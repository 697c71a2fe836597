// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-entity "currently processing" guard sets (spec §5, §9).
//!
//! The launcher and each monitor hold one of these to prevent two workers
//! from acting on the same id concurrently. A held permit is released when
//! dropped, so a guard survives early returns and `?` propagation.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

/// A process-wide set of ids currently being handled by some worker.
pub struct ProcessingGuard<Id: Eq + Hash + Clone> {
    inflight: Arc<Mutex<HashSet<Id>>>,
}

impl<Id: Eq + Hash + Clone> Default for ProcessingGuard<Id> {
    fn default() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

impl<Id: Eq + Hash + Clone> Clone for ProcessingGuard<Id> {
    fn clone(&self) -> Self {
        Self {
            inflight: self.inflight.clone(),
        }
    }
}

impl<Id: Eq + Hash + Clone> ProcessingGuard<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to claim `id`. Returns `None` if it is already claimed by
    /// another in-flight call; otherwise returns a permit that releases the
    /// claim on drop.
    pub fn try_claim(&self, id: Id) -> Option<ClaimPermit<Id>> {
        let mut inflight = self.inflight.lock();
        if inflight.contains(&id) {
            return None;
        }
        inflight.insert(id.clone());
        Some(ClaimPermit {
            inflight: self.inflight.clone(),
            id: Some(id),
        })
    }

    pub fn is_claimed(&self, id: &Id) -> bool {
        self.inflight.lock().contains(id)
    }
}

/// Releases its id from the owning `ProcessingGuard` on drop.
pub struct ClaimPermit<Id: Eq + Hash + Clone> {
    inflight: Arc<Mutex<HashSet<Id>>>,
    id: Option<Id>,
}

impl<Id: Eq + Hash + Clone> Drop for ClaimPermit<Id> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.inflight.lock().remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_of_same_id_is_refused_while_first_held() {
        let guard = ProcessingGuard::new();
        let first = guard.try_claim("task-1".to_string());
        assert!(first.is_some());
        assert!(guard.try_claim("task-1".to_string()).is_none());
    }

    #[test]
    fn dropping_permit_releases_the_id() {
        let guard = ProcessingGuard::new();
        {
            let _permit = guard.try_claim("task-1".to_string()).unwrap();
            assert!(guard.is_claimed(&"task-1".to_string()));
        }
        assert!(!guard.is_claimed(&"task-1".to_string()));
        assert!(guard.try_claim("task-1".to_string()).is_some());
    }

    #[test]
    fn distinct_ids_claim_independently() {
        let guard = ProcessingGuard::new();
        let _a = guard.try_claim("a".to_string()).unwrap();
        let _b = guard.try_claim("b".to_string()).unwrap();
    }
}
