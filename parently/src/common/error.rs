//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! すべてのAPIレスポンスは `{"success": false, "error": "..."}` 形式で
//! 返すため、`ApiError`は`status_code()`と`client_message()`を提供する。

use axum::http::StatusCode;
use thiserror::Error;

/// Parently backend error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body / query parameter validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication error (missing/invalid credentials or token)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Authorization error (wrong role, not the caller's child)
    #[error("Access denied: {0}")]
    Authorization(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict error (e.g., duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Try again in {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds until the current window resets
        retry_after_secs: u64,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Field encryption/decryption error
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(String),

    /// Password hash error
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    /// Upstream AI endpoint error
    #[error("AI upstream error: {0}")]
    AiUpstream(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Jwt(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Encryption(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AiUpstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message sent to external clients.
    ///
    /// Client-caused errors (validation, auth, not-found, conflict, rate
    /// limit) carry their full message so callers can fix the request.
    /// Server-side errors return a generic message; the detail is only
    /// logged, never exposed.
    pub fn client_message(&self) -> String {
        match self {
            Self::Validation(_)
            | Self::Authentication(_)
            | Self::Authorization(_)
            | Self::NotFound(_)
            | Self::Conflict(_)
            | Self::RateLimited { .. } => self.to_string(),
            Self::Jwt(_) => "Invalid or expired token".to_string(),
            Self::Database(_) | Self::Encryption(_) | Self::PasswordHash(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::AiUpstream(_) => "AI service unavailable".to_string(),
        }
    }
}

/// Result type alias
pub type ApiResult<T> = Result<T, ApiError>;
