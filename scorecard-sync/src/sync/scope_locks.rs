//! Per-scope run exclusivity
//!
//! Two sync runs over the same scope would interleave their cleanup and
//! persist phases and leave the store order-dependent. The registry
//! hands out at most one guard per scope; a second request for a held
//! scope is turned away rather than queued, so the caller gets a fast
//! conflict instead of a stacked run.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::SyncScope;

/// In-process registry of scopes with an active sync run.
///
/// Held scopes are compared field by field, so scope fields carrying
/// separator characters can never run together into a false match.
#[derive(Clone, Default)]
pub struct ScopeLocks {
    held: Arc<Mutex<HashSet<SyncScope>>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the scope for one run.
    ///
    /// Returns `None` when another run already holds it. The guard
    /// releases the scope on drop, including on early error returns.
    pub fn try_acquire(&self, scope: &SyncScope) -> Option<ScopeLockGuard> {
        let mut held = lock_registry(&self.held);
        if !held.insert(scope.clone()) {
            return None;
        }
        Some(ScopeLockGuard {
            scope: scope.clone(),
            registry: Arc::clone(&self.held),
        })
    }
}

/// RAII handle for one held scope.
pub struct ScopeLockGuard {
    scope: SyncScope,
    registry: Arc<Mutex<HashSet<SyncScope>>>,
}

impl Drop for ScopeLockGuard {
    fn drop(&mut self) {
        lock_registry(&self.registry).remove(&self.scope);
    }
}

/// A panicked holder must not wedge the scope forever, so poisoning is
/// recovered rather than propagated.
fn lock_registry(registry: &Mutex<HashSet<SyncScope>>) -> MutexGuard<'_, HashSet<SyncScope>> {
    match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(sheet: &str) -> SyncScope {
        SyncScope {
            owner_id: "o".to_string(),
            client_id: "c".to_string(),
            source_id: "s".to_string(),
            sheet_name: sheet.to_string(),
        }
    }

    #[test]
    fn test_second_acquire_of_held_scope_refused() {
        let locks = ScopeLocks::new();
        let guard = locks.try_acquire(&scope("January"));
        assert!(guard.is_some());
        assert!(locks.try_acquire(&scope("January")).is_none());
    }

    #[test]
    fn test_scope_released_on_drop() {
        let locks = ScopeLocks::new();
        {
            let _guard = locks.try_acquire(&scope("January")).unwrap();
        }
        assert!(locks.try_acquire(&scope("January")).is_some());
    }

    #[test]
    fn test_distinct_scopes_held_concurrently() {
        let locks = ScopeLocks::new();
        let _a = locks.try_acquire(&scope("January")).unwrap();
        let _b = locks.try_acquire(&scope("February")).unwrap();
        assert!(locks.try_acquire(&scope("January")).is_none());
        assert!(locks.try_acquire(&scope("February")).is_none());
    }

    #[test]
    fn test_clones_share_one_registry() {
        let locks = ScopeLocks::new();
        let copy = locks.clone();
        let _guard = locks.try_acquire(&scope("January")).unwrap();
        assert!(copy.try_acquire(&scope("January")).is_none());
    }

    #[test]
    fn test_separator_chars_in_fields_keep_scopes_distinct() {
        // Same text when naively joined, different scopes field by field.
        let first = SyncScope {
            owner_id: "acme:eu".to_string(),
            client_id: "west".to_string(),
            source_id: "s".to_string(),
            sheet_name: "January".to_string(),
        };
        let second = SyncScope {
            owner_id: "acme".to_string(),
            client_id: "eu:west".to_string(),
            source_id: "s".to_string(),
            sheet_name: "January".to_string(),
        };

        let locks = ScopeLocks::new();
        let _guard = locks.try_acquire(&first).unwrap();
        assert!(locks.try_acquire(&second).is_some());
        assert!(locks.try_acquire(&first).is_none());
    }
}
