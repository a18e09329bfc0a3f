//! Bearer token extraction for admin routes.
//!
//! Tokens are not checked here. They are forwarded to the document store as
//! the request credential, and the store's rules decide what they may do.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use menuhub_core::Credential;

use super::error::ApiError;

/// Authentication middleware
pub async fn require_bearer(mut request: Request, next: Next) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.map(|h| h.strip_prefix("Bearer ").map(str::trim)) {
        Some(Some(token)) if !token.is_empty() => token.to_string(),
        Some(Some(_)) => {
            return ApiError::new(StatusCode::UNAUTHORIZED, "invalid_auth", "Bearer token is empty")
                .into_response();
        }
        Some(None) => {
            return ApiError::new(
                StatusCode::UNAUTHORIZED,
                "invalid_auth",
                "Authorization header must use Bearer scheme",
            )
            .into_response();
        }
        None => {
            return ApiError::new(
                StatusCode::UNAUTHORIZED,
                "missing_auth",
                "Authorization header required",
            )
            .into_response();
        }
    };

    request.extensions_mut().insert(Credential::bearer(token));
    next.run(request).await
}
