use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to hash password")]
    PasswordHash,

    #[error("Failed to sign token")]
    TokenSigning,

    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("Not found")]
    NotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("Invalid input: {code}")]
    InvalidInputHint {
        code: &'static str,
        hint: &'static str,
    },

    #[error("Referenced patient does not exist")]
    PatientNotFound,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Idempotency key required")]
    IdempotencyRequired,

    #[error("Duplicate request")]
    DuplicateRequest,
}

impl AppError {
    /// Map constraint violations raised by insert/update statements onto
    /// domain errors. Foreign-key failures can only come from the
    /// `patient_id` references, unique failures from `users.username`.
    pub fn from_write(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db) = e {
            match db.code().as_deref() {
                Some("23503") => return AppError::PatientNotFound,
                Some("23505") => return AppError::UsernameTaken,
                _ => {}
            }
        }
        AppError::Database(e)
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal_error" }),
                )
            }
            AppError::PasswordHash | AppError::TokenSigning => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal_error" }),
                )
            }
            AppError::MissingCredentials => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "missing_credentials" }),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "invalid_credentials" }),
            ),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, json!({ "error": "unauthorized" }))
            }
            AppError::Forbidden(detail) => (
                StatusCode::FORBIDDEN,
                json!({ "error": "forbidden", "detail": detail }),
            ),
            AppError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "not_found" })),
            AppError::InvalidInput(code) => (StatusCode::BAD_REQUEST, json!({ "error": code })),
            AppError::InvalidInputHint { code, hint } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": code, "hint": hint }),
            ),
            AppError::PatientNotFound => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "patient_not_found" }),
            ),
            AppError::UsernameTaken => {
                (StatusCode::CONFLICT, json!({ "error": "username_taken" }))
            }
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": "rate_limited", "detail": "Too many requests" }),
            ),
            AppError::IdempotencyRequired => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "idempotency_required" }),
            ),
            AppError::DuplicateRequest => (
                StatusCode::CONFLICT,
                json!({ "status": "duplicate", "detail": "already processed" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
