//! HTTP error mapping.
//!
//! Handler failures funnel through [`ApiError`], which renders as the
//! status code plus a `{"detail": ...}` JSON body. Auth failures keep
//! their client-facing wording; store and runtime failures collapse to a
//! 500 with the detail logged server-side.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Errors a handler can surface to a client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No agent registered under the requested name.
    #[error("Agent '{0}' not found")]
    AgentNotFound(String),

    /// Bearer-token verification failed. The payload is the exact detail
    /// string shown to the client.
    #[error("{0}")]
    Unauthorized(String),

    /// Anything the client cannot act on.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Expired | AuthError::Invalid => ApiError::Unauthorized(err.to_string()),
            AuthError::Signing { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::AgentNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({"detail": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_unauthorized_details() {
        let expired: ApiError = AuthError::Expired.into();
        assert!(matches!(expired, ApiError::Unauthorized(ref d) if d == "Token expired"));

        let invalid: ApiError = AuthError::Invalid.into();
        assert!(matches!(invalid, ApiError::Unauthorized(ref d) if d == "Invalid token"));
    }

    #[test]
    fn not_found_detail_names_the_agent() {
        let err = ApiError::AgentNotFound("ghost_agent".to_string());
        assert_eq!(err.to_string(), "Agent 'ghost_agent' not found");
    }

    #[test]
    fn store_errors_become_internal() {
        let err: ApiError = StoreError::Backend {
            message: "connection refused".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
