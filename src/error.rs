use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::engine::scheduling::ScheduleError;
use crate::engine::wizard::WizardError;

pub const LOGIN_PATH: &str = "/autentificare";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("access restricted")]
    Restricted { redirect_after_ms: u64 },

    #[error("backend error: {0}")]
    Backend(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unauthorized => AppError::Unauthorized,
            other => AppError::Backend(other.to_string()),
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::UnknownLocation(_) => AppError::NotFound(err.to_string()),
            WizardError::LocationUnavailable(_) | WizardError::SubmissionInFlight => {
                AppError::Conflict(err.to_string())
            }
            WizardError::Schedule(inner) => inner.into(),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": msg }))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "authentication required", "redirect": LOGIN_PATH }),
            ),
            AppError::Restricted { redirect_after_ms } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "access restricted to administrators",
                    "redirect": HOME_PATH,
                    "redirect_after_ms": redirect_after_ms,
                }),
            ),
            AppError::Backend(msg) => (StatusCode::BAD_GATEWAY, json!({ "error": msg })),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
        };

        (status, Json(body)).into_response()
    }
}
