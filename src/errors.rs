use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::TimeSlot;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("bad payload: {0}")]
    BadPayload(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidSignature => StatusCode::BAD_REQUEST,
            AppError::BadPayload(_) => StatusCode::BAD_REQUEST,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// Failure talking to the calendar, the spreadsheet or the pending store.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned status {status}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("{service} returned malformed data: {detail}")]
    Malformed {
        service: &'static str,
        detail: String,
    },

    #[error("pending store error: {0:#}")]
    PendingStore(anyhow::Error),
}

impl CollaboratorError {
    pub fn http(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| CollaboratorError::Http { service, source }
    }
}

/// A command the requester got wrong. Never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed command, expected: {usage}")]
    Malformed { usage: &'static str },

    #[error("selection {reference} does not match an available slot")]
    NoSuchSlot { reference: usize },

    #[error("slot {0} is already booked")]
    SlotTaken(TimeSlot),
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] CollaboratorError),
}
