//! API error handling.
//!
//! Errors are rendered in cobalt's own error shape so clients can treat this
//! proxy exactly like a cobalt instance:
//! `{"status":"error","error":{"code":"..."}}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::Error;

/// Error code for a request body that is not JSON.
pub const CODE_BAD_REQUEST: &str = "error.proxy.bad_request";
/// Error code for missing buffer query parameters.
pub const CODE_BUFFER_PARAMS: &str = "error.proxy.buffer.params";
/// Error code for an invalid or expired buffer link.
pub const CODE_BUFFER_SIGNATURE: &str = "error.proxy.buffer.signature";
/// Error code for a signed link to a host outside the allowlist.
pub const CODE_BUFFER_HOST: &str = "error.proxy.buffer.host";
/// Error code for a failed buffer fetch.
pub const CODE_BUFFER_UPSTREAM: &str = "error.proxy.buffer.upstream";
/// Error code for a failed call to the upstream API.
pub const CODE_PROXY_FAIL: &str = "error.proxy.fail";

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: String,
}

/// API error response body.
#[derive(Debug, Serialize)]
struct ApiErrorResponse {
    status: &'static str,
    error: ErrorDetail,
}

/// API error type that can be converted to HTTP responses.
///
/// `message` is for logs only and never reaches the client.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400, body was not JSON.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, CODE_BAD_REQUEST, message)
    }

    /// 400, a buffer parameter is missing.
    pub fn missing_params(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, CODE_BUFFER_PARAMS, message)
    }

    /// 403, the buffer link did not verify.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, CODE_BUFFER_SIGNATURE, message)
    }

    /// 403, the buffer link points outside the allowlist.
    pub fn forbidden_host(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, CODE_BUFFER_HOST, message)
    }

    /// 502, the buffer target failed.
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, CODE_BUFFER_UPSTREAM, message)
    }

    /// 502, the upstream API call failed.
    pub fn proxy_fail(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, CODE_PROXY_FAIL, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            status: "error",
            error: ErrorDetail {
                code: self.code.to_string(),
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        tracing::error!(error = %err, "Proxy request failed");
        ApiError::proxy_fail(err.to_string())
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::forbidden_host("evil.example.com");
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, CODE_BUFFER_HOST);
        assert_eq!(err.message, "evil.example.com");
    }

    #[test]
    fn test_error_conversion() {
        let err: ApiError = Error::Other("boom".into()).into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.code, CODE_PROXY_FAIL);
    }

    #[tokio::test]
    async fn test_error_body_shape_hides_message() {
        let response = ApiError::bad_gateway("connection reset by 10.0.0.3").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "error", "error": { "code": CODE_BUFFER_UPSTREAM } })
        );
    }
}
