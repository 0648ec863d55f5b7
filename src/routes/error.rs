use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    api_types::ErrorResponse,
    auth::AuthError,
    authz::AuthzError,
    db::DbError,
    observability::metrics,
    services::{AccountError, ServiceError},
};

/// Error returned by every portal handler.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    BadRequest(String),
    /// A write touched fields the caller's role may not change
    RestrictedFields(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Database(DbError),
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            DbError::Conflict(msg) => ApiError::Conflict(msg),
            DbError::Validation(msg) => ApiError::BadRequest(msg),
            _ => ApiError::Database(err),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::AccessDenied(msg) => ApiError::Forbidden(msg),
            AuthzError::RestrictedFields { .. } => ApiError::RestrictedFields(err.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => e.into(),
            ServiceError::Authz(e) => e.into(),
            ServiceError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            ServiceError::Validation(msg) => ApiError::BadRequest(msg),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Database(e) => e.into(),
            AccountError::Authz(e) => e.into(),
            AccountError::NotRegistered | AccountError::NotFound => {
                ApiError::NotFound(err.to_string())
            }
            AccountError::Inactive => ApiError::Auth(AuthError::InactiveAccount),
            AccountError::MissingProfile(msg) | AccountError::BackupEmailUnavailable(msg) => {
                ApiError::BadRequest(msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            ApiError::Auth(err) => return err.into_response(),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "bad_request",
                msg,
            ),
            ApiError::RestrictedFields(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "restricted_fields",
                msg,
            ),
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, "permission_error", "forbidden", msg)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found_error", "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict_error", "conflict", msg),
            ApiError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    "database_error",
                    "An internal database error occurred".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        metrics::record_api_error(error_type, status.as_u16());

        (
            status,
            Json(ErrorResponse::with_type(error_type, code, message)),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn envelope(err: impl Into<ApiError>) -> (StatusCode, serde_json::Value) {
        let response = err.into().into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_restricted_fields_is_bad_request() {
        let (status, body) = envelope(AuthzError::RestrictedFields {
            allowed: "verified, tags".into(),
            rejected: vec!["title"],
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "restricted_fields");
        assert!(body["error"]["message"].as_str().unwrap().contains("title"));
    }

    #[tokio::test]
    async fn test_access_denied_is_forbidden() {
        let (status, body) = envelope(AuthzError::access_denied("staff only")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["type"], "permission_error");
    }

    #[tokio::test]
    async fn test_hidden_record_is_not_found() {
        let (status, body) = envelope(ServiceError::NotFound("Experience")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Experience not found");
    }

    #[tokio::test]
    async fn test_conflict_and_database_errors() {
        let (status, _) = envelope(DbError::Conflict("Company name taken".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = envelope(DbError::Internal("disk on fire".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["type"], "server_error");
        assert!(!body["error"]["message"].as_str().unwrap().contains("disk"));
    }

    #[tokio::test]
    async fn test_outside_domain_is_not_found() {
        let (status, _) = envelope(AccountError::NotRegistered).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
