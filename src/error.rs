use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Identity already registered: {0}")]
    DuplicateIdentity(String),

    #[error("Invalid email or password")]
    InvalidCredential,

    #[error("Missing or expired session")]
    Unauthorized,

    #[error("{0} requires a Premium or Ultimate subscription")]
    FeatureGated(&'static str),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Daily generation limit reached")]
    QuotaExceeded,

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    #[error("Generation not found: {0}")]
    GenerationNotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Synthesis failed: {0}")]
    Engine(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::DuplicateIdentity(id) => (
                StatusCode::CONFLICT,
                "DUPLICATE_IDENTITY",
                format!("'{}' is already registered", id),
            ),
            AppError::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIAL",
                self.to_string(),
            ),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string())
            }
            AppError::FeatureGated(_) => {
                (StatusCode::FORBIDDEN, "FEATURE_GATED", self.to_string())
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::QuotaExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "QUOTA_EXCEEDED",
                self.to_string(),
            ),
            AppError::VoiceNotFound(v) => (
                StatusCode::NOT_FOUND,
                "VOICE_NOT_FOUND",
                format!("Voice '{}' not found", v),
            ),
            AppError::GenerationNotFound(g) => (
                StatusCode::NOT_FOUND,
                "GENERATION_NOT_FOUND",
                format!("Generation '{}' not found", g),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Engine(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ENGINE_ERROR",
                msg.clone(),
            ),
            AppError::Database(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                e.to_string(),
            ),
            AppError::IoError(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                e.to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {} - {}", code, message);
        } else {
            tracing::debug!("Request rejected: {} - {}", code, message);
        }

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}
