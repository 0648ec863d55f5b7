use serde::{Deserialize, Serialize};

/// Standard error response body.
///
/// Shape: `{"error": {"type": "...", "message": "...", "code": "...", "request_id": "..."}}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error information
    pub error: ErrorInfo,
}

/// Error information.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error kind (e.g. "invalid_request_error", "permission_error")
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Machine-readable error code
    pub code: Option<String>,
    /// Request ID for correlating errors with logs.
    /// Populated by the request ID middleware.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Types used by the portal:
    /// - "invalid_request_error" - malformed payload or disallowed field combination
    /// - "authentication_error" - missing or invalid bearer token
    /// - "upstream_identity_error" - identity provider token rejected
    /// - "permission_error" - authenticated but role insufficient
    /// - "not_found_error" - record absent or not visible to the caller
    /// - "conflict_error" - uniqueness or concurrent modification
    /// - "server_error" - internal failure
    pub fn with_type(
        error_type: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorInfo {
                error_type: error_type.into(),
                message: message.into(),
                code: Some(code.into()),
                request_id: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_shape() {
        let body = serde_json::to_value(ErrorResponse::with_type(
            "permission_error",
            "forbidden",
            "nope",
        ))
        .unwrap();

        assert_eq!(body["error"]["type"], "permission_error");
        assert_eq!(body["error"]["code"], "forbidden");
        assert_eq!(body["error"]["message"], "nope");
        assert!(body["error"].get("request_id").is_none());
    }
}
