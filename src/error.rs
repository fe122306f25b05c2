// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// No PKCE verifier on file: the authorization flow was never started,
    /// was already completed, or a later flow overwrote it.
    #[error("Canva authorization flow is not in progress")]
    InvalidFlowState,

    /// User has no Canva credential record at all.
    #[error("Canva account not connected")]
    NotConnected,

    #[error("Canva token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Canva token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("Canva autofill failed: {0}")]
    Autofill(String),

    #[error("Canva export initiation failed: {0}")]
    ExportInitiation(String),

    #[error("Canva export failed: {0}")]
    ExportFailed(String),

    #[error("Canva export did not complete in time")]
    ExportTimeout,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for errors produced by the Canva integration itself (as opposed
    /// to bad input or our own storage failing). The autofill endpoint falls
    /// back to the overlay transform for exactly these.
    pub fn is_canva_error(&self) -> bool {
        matches!(
            self,
            AppError::NotConnected
                | AppError::InvalidFlowState
                | AppError::TokenExchange(_)
                | AppError::TokenRefresh(_)
                | AppError::Autofill(_)
                | AppError::ExportInitiation(_)
                | AppError::ExportFailed(_)
                | AppError::ExportTimeout
        )
    }

    /// True when the only fix is the user re-connecting their Canva account.
    pub fn needs_reconnect(&self) -> bool {
        matches!(self, AppError::NotConnected | AppError::TokenRefresh(_))
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::InvalidFlowState => {
                (StatusCode::BAD_REQUEST, "canva_flow_not_started", None)
            }
            AppError::NotConnected => (StatusCode::CONFLICT, "canva_not_connected", None),
            AppError::TokenExchange(msg) => (
                StatusCode::BAD_GATEWAY,
                "canva_token_exchange_failed",
                Some(msg.clone()),
            ),
            AppError::TokenRefresh(_) => {
                // Refresh token revoked or expired upstream. The stored
                // credential is unusable until the user re-connects.
                (StatusCode::CONFLICT, "canva_reconnect_required", None)
            }
            AppError::Autofill(msg) => {
                (StatusCode::BAD_GATEWAY, "canva_autofill_failed", Some(msg.clone()))
            }
            AppError::ExportInitiation(msg) => (
                StatusCode::BAD_GATEWAY,
                "canva_export_failed",
                Some(msg.clone()),
            ),
            AppError::ExportFailed(msg) => (
                StatusCode::BAD_GATEWAY,
                "canva_export_failed",
                Some(msg.clone()),
            ),
            AppError::ExportTimeout => {
                (StatusCode::GATEWAY_TIMEOUT, "canva_export_timeout", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
