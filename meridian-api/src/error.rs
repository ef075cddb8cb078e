use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use meridian_trip::checkout::CheckoutError;
use meridian_trip::conflict::ConflictPair;
use meridian_trip::draft::DraftError;
use meridian_trip::manager::TripError;

/// Every exit path of the API has a named kind; nothing surfaces as an
/// opaque failure.
#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    Forbidden,
    NotFound(String),
    ValidationError(String),
    InvalidState(String),
    NoPaymentMethod { redirect: String },
    Conflict(Vec<ConflictPair>),
    DuplicateOperation,
    CheckoutFailed(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::AuthenticationError(msg) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "unauthenticated", "message": msg }),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": "forbidden" })),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "not_found", "message": msg }),
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "validation_error", "message": msg }),
            ),
            AppError::InvalidState(msg) => (
                StatusCode::CONFLICT,
                json!({ "error": "invalid_state", "message": msg }),
            ),
            AppError::NoPaymentMethod { redirect } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "no_payment_method", "redirect": redirect }),
            ),
            AppError::Conflict(conflicts) => (
                StatusCode::CONFLICT,
                json!({ "error": "conflict", "conflicts": conflicts }),
            ),
            AppError::DuplicateOperation => (
                StatusCode::CONFLICT,
                json!({ "error": "duplicate_operation" }),
            ),
            AppError::CheckoutFailed(msg) => {
                tracing::error!("Checkout failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "checkout_failed", "message": msg }),
                )
            }
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::NotFound(msg) => AppError::NotFound(msg),
            CheckoutError::Forbidden => AppError::Forbidden,
            CheckoutError::InvalidState(msg) => AppError::InvalidState(msg),
            CheckoutError::Validation(msg) => AppError::ValidationError(msg),
            CheckoutError::NoPaymentMethod { redirect } => AppError::NoPaymentMethod { redirect },
            CheckoutError::Conflict(conflicts) => AppError::Conflict(conflicts),
            CheckoutError::DuplicateOperation => AppError::DuplicateOperation,
            CheckoutError::Failed(msg) => AppError::CheckoutFailed(msg),
        }
    }
}

impl From<TripError> for AppError {
    fn from(err: TripError) -> Self {
        match err {
            TripError::NotFound(msg) => AppError::NotFound(msg),
            TripError::Forbidden => AppError::Forbidden,
            TripError::InvalidState(msg) => AppError::InvalidState(msg),
            TripError::Validation(msg) => AppError::ValidationError(msg),
            TripError::Store(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<DraftError> for AppError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::Store(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}
