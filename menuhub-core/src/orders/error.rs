use thiserror::Error;

use crate::store::StoreError;

/// Errors from placing or managing orders.
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("No order with id {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Store returned an order without an id")]
    MissingId,
}

impl OrderError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        OrderError::Validation {
            field,
            reason: reason.into(),
        }
    }
}
