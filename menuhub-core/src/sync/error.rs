//! Sync error types.

use thiserror::Error;

use super::report::SyncReport;
use crate::store::{ErrorCode, StoreError};

/// A failure that stops a sync run.
///
/// Failures of single items do not stop a run; they are collected in
/// [`SyncReport::failures`](super::SyncReport::failures).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// The private collection could not be read.
    #[error("Failed to read {collection}: {source}")]
    Source {
        collection: String,
        #[source]
        source: StoreError,
    },

    /// A full sync published categories, then failed on recipes.
    #[error("Recipes not synced after {completed}: {source}")]
    Incomplete {
        completed: Box<SyncReport>,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SyncError::Source { source, .. } => source.code,
            SyncError::Incomplete { source, .. } => source.code(),
        }
    }
}
