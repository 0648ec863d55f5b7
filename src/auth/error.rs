use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{api_types::ErrorResponse, observability::metrics};

#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token on a protected route
    #[error("Authentication credentials required")]
    MissingCredentials,

    /// Malformed, badly signed or wrong-kind session token
    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Authentication token has expired")]
    ExpiredToken,

    /// Token is valid but its account no longer exists or is disabled
    #[error("Account is not active")]
    InactiveAccount,

    /// Google rejected the ID token (signature, issuer, audience, expiry, unverified email)
    #[error("Identity token rejected: {0}")]
    IdentityRejected(String),

    /// Google's signing keys could not be fetched
    #[error("Identity provider unavailable: {0}")]
    IdentityProviderUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match &self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "missing_credentials",
                self.to_string(),
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_token",
                self.to_string(),
            ),
            AuthError::ExpiredToken => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "expired_token",
                self.to_string(),
            ),
            AuthError::InactiveAccount => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "inactive_account",
                self.to_string(),
            ),
            // Details stay in the logs
            AuthError::IdentityRejected(reason) => {
                tracing::debug!(reason = %reason, "ID token rejected");
                (
                    StatusCode::UNAUTHORIZED,
                    "upstream_identity_error",
                    "invalid_id_token",
                    "Invalid Google ID token".to_string(),
                )
            }
            AuthError::IdentityProviderUnavailable(reason) => {
                tracing::error!(reason = %reason, "Identity provider unavailable");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_identity_error",
                    "identity_provider_unavailable",
                    "Could not reach the identity provider".to_string(),
                )
            }
            AuthError::Internal(reason) => {
                tracing::error!(reason = %reason, "Internal authentication error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        metrics::record_api_error(error_type, status.as_u16());

        let body = ErrorResponse::with_type(error_type, code, message);
        (status, Json(body)).into_response()
    }
}
