//! Public mirror synchronization.
//!
//! Restaurant catalogs are written to private, credential-gated collections.
//! Customers read a flat public copy. [`SyncEngine`] keeps the two in step
//! with an idempotent get-then-update-or-create per item.

mod engine;
mod error;
mod lock;
mod report;

pub use engine::{Retention, SyncEngine, Upsert};
pub use error::SyncError;
pub use lock::{LockGuard, SyncClass, SyncLocks, SyncStatus};
pub use report::{FullSyncReport, ItemFailure, SyncReport};
