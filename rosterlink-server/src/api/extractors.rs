//! Custom Axum extractors for request authentication.
//!
//! Provides `AdminAuth`, which checks the `Rosterlink-Admin-Authorization`
//! header against the argon2 hash of the admin secret.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use rosterlink_sdk::headers::ADMIN_AUTH_HEADER;

use crate::state::AppState;

/// Marker extractor: the request carried the correct admin secret.
///
/// # Header format
///
/// ```text
/// Rosterlink-Admin-Authorization: {plaintext_admin_secret}
/// ```
pub struct AdminAuth;

/// Errors that can occur during admin authentication.
#[derive(Debug, thiserror::Error)]
pub enum AdminAuthError {
    #[error("missing Rosterlink-Admin-Authorization header")]
    MissingHeader,
    #[error("invalid Rosterlink-Admin-Authorization header")]
    InvalidHeader,
    #[error("admin secret verification failed")]
    VerificationFailed,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AdminAuthError::MissingHeader => (
                StatusCode::UNAUTHORIZED,
                "missing Rosterlink-Admin-Authorization header",
            ),
            AdminAuthError::InvalidHeader => (
                StatusCode::BAD_REQUEST,
                "invalid Rosterlink-Admin-Authorization header",
            ),
            AdminAuthError::VerificationFailed => {
                (StatusCode::UNAUTHORIZED, "admin secret verification failed")
            }
        };
        (status, message).into_response()
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = parts
            .headers
            .get(ADMIN_AUTH_HEADER)
            .ok_or(AdminAuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AdminAuthError::InvalidHeader)?;

        let admin = state.config.admin().await.clone();
        if !admin.verify_secret(secret) {
            tracing::warn!("Rejected admin request with a wrong secret");
            return Err(AdminAuthError::VerificationFailed);
        }
        Ok(AdminAuth)
    }
}
