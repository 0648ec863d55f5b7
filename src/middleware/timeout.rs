use std::time::Duration;

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{api_types::ErrorResponse, observability::metrics};

/// Abandons handlers that run longer than the configured server timeout.
pub async fn timeout_middleware(
    State(limit): State<Duration>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(path = %path, timeout_secs = limit.as_secs(), "Request timed out");
            metrics::record_api_error("server_error", StatusCode::REQUEST_TIMEOUT.as_u16());
            (
                StatusCode::REQUEST_TIMEOUT,
                Json(ErrorResponse::with_type(
                    "server_error",
                    "request_timeout",
                    "The request took too long to process",
                )),
            )
                .into_response()
        }
    }
}
