//! Per-class sync locks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Granularity at which syncs exclude each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncClass {
    Categories,
    Recipes,
    All,
}

impl SyncClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncClass::Categories => "categories",
            SyncClass::Recipes => "recipes",
            SyncClass::All => "all",
        }
    }
}

impl std::fmt::Display for SyncClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of which sync classes are running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub categories: bool,
    pub recipes: bool,
    pub all: bool,
}

impl SyncStatus {
    pub fn is_idle(&self) -> bool {
        !(self.categories || self.recipes || self.all)
    }
}

/// One in-flight flag per sync class.
///
/// Engines that should coalesce with each other share one instance through
/// an `Arc`.
#[derive(Debug, Default)]
pub struct SyncLocks {
    categories: AtomicBool,
    recipes: AtomicBool,
    all: AtomicBool,
}

impl SyncLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self, class: SyncClass) -> &AtomicBool {
        match class {
            SyncClass::Categories => &self.categories,
            SyncClass::Recipes => &self.recipes,
            SyncClass::All => &self.all,
        }
    }

    /// Takes the lock for `class`, or returns `None` if it is already held.
    pub fn try_acquire(self: &Arc<Self>, class: SyncClass) -> Option<LockGuard> {
        self.flag(class)
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LockGuard {
                locks: Arc::clone(self),
                class,
            })
    }

    pub fn is_held(&self, class: SyncClass) -> bool {
        self.flag(class).load(Ordering::Acquire)
    }

    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            categories: self.is_held(SyncClass::Categories),
            recipes: self.is_held(SyncClass::Recipes),
            all: self.is_held(SyncClass::All),
        }
    }
}

/// Holds one sync class; releases it when dropped.
#[derive(Debug)]
pub struct LockGuard {
    locks: Arc<SyncLocks>,
    class: SyncClass,
}

impl LockGuard {
    pub fn class(&self) -> SyncClass {
        self.class
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.locks.flag(self.class).store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_is_exclusive_per_class() {
        let locks = Arc::new(SyncLocks::new());
        let guard = locks.try_acquire(SyncClass::Categories).unwrap();

        assert!(locks.try_acquire(SyncClass::Categories).is_none());
        assert!(locks.try_acquire(SyncClass::Recipes).is_some());
        assert_eq!(guard.class(), SyncClass::Categories);
        assert!(locks.status().categories);
    }

    #[test]
    fn test_drop_releases() {
        let locks = Arc::new(SyncLocks::new());
        {
            let _guard = locks.try_acquire(SyncClass::All).unwrap();
            assert!(locks.is_held(SyncClass::All));
        }
        assert!(locks.status().is_idle());
        assert!(locks.try_acquire(SyncClass::All).is_some());
    }

    #[test]
    fn test_status_is_a_snapshot() {
        let locks = Arc::new(SyncLocks::new());
        let guard = locks.try_acquire(SyncClass::Recipes).unwrap();
        let status = locks.status();
        drop(guard);

        assert!(status.recipes);
        assert!(!locks.status().recipes);
    }
}
