//! Error types for the HTTP surface.
//!
//! [`ApiError`] wraps everything a handler can fail with and implements
//! [`IntoResponse`], so handlers can use `?` and still answer with a
//! meaningful status code and a JSON body of the form `{"error": "..."}`.
//!
//! ## Status mapping
//! - `IdGeneration(ClockRegression)`: `503 Service Unavailable` with a
//!   `Retry-After` header, since the condition clears once the clock catches
//!   up.
//! - `IdGeneration(_)`: `500 Internal Server Error`.
//! - `InvalidRequest`: `400 Bad Request`.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub type Result<T> = core::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The generator refused to issue an ID.
    #[error("ID generation error: {0}")]
    IdGeneration(#[from] snowfall::Error),

    /// The client request was malformed.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::IdGeneration(snowfall::Error::ClockRegression { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::IdGeneration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Whole seconds a client should wait before retrying, rounded up.
    fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::IdGeneration(snowfall::Error::ClockRegression { behind_ms }) => {
                Some(behind_ms.div_ceil(1000).max(1))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let retry_after = self.retry_after_secs();
        let mut response = (
            self.status(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response();

        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
