//! Document store error types.

use serde::Serialize;
use thiserror::Error;

/// Canonical error codes reported by the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    AlreadyExists,
    PermissionDenied,
    Unauthenticated,
    InvalidArgument,
    FailedPrecondition,
    Unavailable,
    DeadlineExceeded,
    Internal,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::FailedPrecondition => "FAILED_PRECONDITION",
            ErrorCode::Unavailable => "UNAVAILABLE",
            ErrorCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            ErrorCode::Internal => "INTERNAL",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }

    /// Parse from the `status` string of an error body.
    pub fn parse(status: &str) -> Self {
        match status.to_uppercase().as_str() {
            "NOT_FOUND" => ErrorCode::NotFound,
            "ALREADY_EXISTS" => ErrorCode::AlreadyExists,
            "PERMISSION_DENIED" => ErrorCode::PermissionDenied,
            "UNAUTHENTICATED" => ErrorCode::Unauthenticated,
            "INVALID_ARGUMENT" => ErrorCode::InvalidArgument,
            "FAILED_PRECONDITION" => ErrorCode::FailedPrecondition,
            "UNAVAILABLE" => ErrorCode::Unavailable,
            "DEADLINE_EXCEEDED" => ErrorCode::DeadlineExceeded,
            "INTERNAL" => ErrorCode::Internal,
            _ => ErrorCode::Unknown,
        }
    }

    /// Fallback mapping when the body carries no usable status.
    pub fn from_http(status: u16) -> Self {
        match status {
            400 => ErrorCode::InvalidArgument,
            401 => ErrorCode::Unauthenticated,
            403 => ErrorCode::PermissionDenied,
            404 => ErrorCode::NotFound,
            409 => ErrorCode::AlreadyExists,
            412 => ErrorCode::FailedPrecondition,
            500 => ErrorCode::Internal,
            503 => ErrorCode::Unavailable,
            504 => ErrorCode::DeadlineExceeded,
            _ => ErrorCode::Unknown,
        }
    }

    /// Whether a request failing with this code is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorCode::Unavailable | ErrorCode::DeadlineExceeded)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error returned by a [`DocumentStore`](super::DocumentStore) call.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub code: ErrorCode,
    pub message: String,
}

impl StoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(path: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Document not found: {}", path))
    }

    pub fn already_exists(path: &str) -> Self {
        Self::new(
            ErrorCode::AlreadyExists,
            format!("Document already exists: {}", path),
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.code == ErrorCode::AlreadyExists
    }

    pub fn is_transient(&self) -> bool {
        self.code.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(ErrorCode::parse("NOT_FOUND"), ErrorCode::NotFound);
        assert_eq!(ErrorCode::parse("already_exists"), ErrorCode::AlreadyExists);
        assert_eq!(ErrorCode::parse("RESOURCE_EXHAUSTED"), ErrorCode::Unknown);
    }

    #[test]
    fn test_from_http() {
        assert_eq!(ErrorCode::from_http(404), ErrorCode::NotFound);
        assert_eq!(ErrorCode::from_http(409), ErrorCode::AlreadyExists);
        assert_eq!(ErrorCode::from_http(503), ErrorCode::Unavailable);
        assert_eq!(ErrorCode::from_http(418), ErrorCode::Unknown);
    }

    #[test]
    fn test_transient_codes() {
        assert!(ErrorCode::Unavailable.is_transient());
        assert!(ErrorCode::DeadlineExceeded.is_transient());
        assert!(!ErrorCode::PermissionDenied.is_transient());
        assert!(!ErrorCode::AlreadyExists.is_transient());
    }

    #[test]
    fn test_display() {
        let err = StoreError::not_found("public-categories/c1");
        assert_eq!(
            err.to_string(),
            "NOT_FOUND: Document not found: public-categories/c1"
        );
    }
}
