use thiserror::Error;

use crate::media::MediaError;
use crate::store::{ErrorCode, StoreError};

/// Errors from admin catalog mutations. Sync problems never show up here.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Image upload failed: {0}")]
    Media(#[from] MediaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Store returned a {0} without an id")]
    MissingId(&'static str),
}

impl CatalogError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        CatalogError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Store error code behind this error, if any.
    pub fn store_code(&self) -> Option<ErrorCode> {
        match self {
            CatalogError::Store(e) => Some(e.code),
            _ => None,
        }
    }
}
