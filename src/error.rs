use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Typed error taxonomy for the booking core. Every variant maps to exactly
/// one HTTP status; nothing in the service layer talks status codes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("not authorized: {0}")]
    Unauthorized(&'static str),

    #[error("seats unavailable: {0:?}")]
    SeatsUnavailable(Vec<String>),

    #[error("reservation conflict after {attempts} attempts")]
    ReservationConflict { attempts: u32 },

    #[error("invalid transition from {from} to {to}")]
    InvalidStateTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("cancellation window closed")]
    CancellationWindowClosed,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::SeatsUnavailable(_) => "seats_unavailable",
            ApiError::ReservationConflict { .. } => "reservation_conflict",
            ApiError::InvalidStateTransition { .. } => "invalid_state_transition",
            ApiError::CancellationWindowClosed => "cancellation_window_closed",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::SeatsUnavailable(_)
            | ApiError::InvalidStateTransition { .. }
            | ApiError::CancellationWindowClosed => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::ReservationConflict { .. } => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "error": self.code(),
            "message": self.to_string(),
        });

        match &self {
            ApiError::SeatsUnavailable(seats) => {
                body["unavailable_seats"] = json!(seats);
            }
            ApiError::ReservationConflict { .. } => {
                // Retries were exhausted under contention; the client may
                // simply resubmit the same request.
                body["retryable"] = json!(true);
            }
            _ => {}
        }

        (self.status(), Json(body)).into_response()
    }
}
