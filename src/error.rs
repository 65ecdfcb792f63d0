use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Application-wide error taxonomy. Services return these; the HTTP layer
/// owns the status-code mapping in `IntoResponse`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    /// Seat conflicts, duplicate selections, and optimistic-lock race losers.
    /// Clients can safely re-fetch the seat map and retry with other seats.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("not enough seats available: requested {requested}, available {available}")]
    InsufficientSeats { requested: usize, available: i32 },

    /// Transient simulated-gateway decline; the booking stays retryable.
    #[error("payment declined: {0}")]
    PaymentDeclined(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            AppError::InvalidTransition(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
            AppError::InsufficientSeats { .. } => (StatusCode::CONFLICT, self.to_string()),
            AppError::PaymentDeclined(_) => (StatusCode::PAYMENT_REQUIRED, self.to_string()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
            AppError::Database(e) => {
                tracing::error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(m) => {
                tracing::error!("internal error: {}", m);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
