use axum::{
    Json,
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorBody;
use crate::upstream::UpstreamError;
use crate::validation::ValidationError;

pub const CORS_HEADERS: [(HeaderName, &str); 2] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        "authorization, x-client-info, apikey, content-type",
    ),
];

const GENERIC_FAILURE: &str = "An error occurred. Please try again.";

// Every way a relay request can fail. Each variant maps to one HTTP status.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid request body")]
    Malformed,

    #[error(transparent)]
    Validation(ValidationError),

    #[error("Too many requests. Please try again later.")]
    QuotaExceeded { retry_after_secs: u64 },

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl From<ValidationError> for RelayError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::NotAnObject => Self::Malformed,
            other => Self::Validation(other),
        }
    }
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Malformed | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    // label for the outcomes counter
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Validation(_) => "validation_rejected",
            Self::QuotaExceeded { .. } => "quota_rejected",
            Self::Upstream(_) => "upstream_failed",
            Self::MethodNotAllowed => "method_not_allowed",
        }
    }

    // What the browser sees. Upstream detail stays in the logs.
    fn client_message(&self) -> String {
        match self {
            Self::Upstream(_) => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            error: self.client_message(),
        });

        match self {
            Self::QuotaExceeded { retry_after_secs } => (
                status,
                CORS_HEADERS,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                body,
            )
                .into_response(),
            _ => (status, CORS_HEADERS, body).into_response(),
        }
    }
}
