//! API error mapping.
//!
//! Precondition violations are expected control flow and render as
//! `{success:false, error}`; persistence failures and derived-state
//! inconsistencies are logged with context and surface as a 500 with no
//! detail leaked. Nothing is retried; the client's next poll recovers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use persistence::StoreError;
use serde_json::json;
use sim_engine::EngineError;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    /// Expected rejection with a player-facing message.
    Precondition(String),
    /// Missing or invalid session cookie.
    Unauthorized,
    /// Storage or invariant failure; logged, opaque to the client.
    Internal(String),
}

impl ApiError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            // A business with no product row is corrupt state, not a
            // player mistake.
            EngineError::MissingProduct => Self::Internal(e.to_string()),
            EngineError::Econ(inner) => Self::Internal(inner.to_string()),
            other => Self::Precondition(other.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InsufficientFunds => Self::Precondition(e.to_string()),
            StoreError::Conflict(msg) => Self::Precondition(msg.to_string()),
            StoreError::NotFound("offered technology") => {
                Self::Precondition("Technology is not available".to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Precondition(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": message })),
            )
                .into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "success": false, "error": "Not logged in" })),
            )
                .into_response(),
            Self::Internal(detail) => {
                error!(%detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}
