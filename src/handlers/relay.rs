use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{CORS_HEADERS, RelayError};
use crate::metrics::{REQUEST_TOTAL, record_outcome};
use crate::models::Ack;
use crate::rate_limit::QuotaDecision;
use crate::state::AppState;
use crate::validation::validate;

pub const UNKNOWN_CLIENT: &str = "unknown";

// Key for the rate window: first X-Forwarded-For hop, then X-Real-IP
pub fn client_identifier(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

// Every path that is not /health or /metrics lands here
pub async fn relay_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    // preflight bypasses quota and validation
    if method == Method::OPTIONS {
        record_outcome("preflight");
        return (StatusCode::OK, CORS_HEADERS).into_response();
    }

    if method != Method::POST {
        let err = RelayError::MethodNotAllowed;
        record_outcome(err.outcome());
        return err.into_response();
    }

    REQUEST_TOTAL.inc();
    let client = client_identifier(&headers);

    match relay(&state, &client, body).await {
        Ok(()) => {
            record_outcome("acknowledged");
            (StatusCode::OK, CORS_HEADERS, Json(Ack::sent())).into_response()
        }
        Err(err) => {
            record_outcome(err.outcome());
            err.into_response()
        }
    }
}

async fn relay(
    state: &AppState,
    client: &str,
    body: Result<Bytes, BytesRejection>,
) -> Result<(), RelayError> {
    if let Some(quota) = &state.quota {
        match quota.check(client, Instant::now()).await {
            QuotaDecision::Allowed { remaining } => debug!(client, remaining, "Quota ok"),
            QuotaDecision::Exceeded { retry_after } => {
                warn!(client, "Quota exceeded");
                return Err(RelayError::QuotaExceeded {
                    retry_after_secs: retry_after.as_secs(),
                });
            }
        }
    }

    // oversized or unreadable bodies still get the JSON + CORS answer
    let body = body.map_err(|e| {
        warn!(client, status = %e.status(), error = %e, "Unreadable request body");
        RelayError::Malformed
    })?;

    let payload: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(client, error = %e, "Unparseable request body");
        RelayError::Malformed
    })?;

    let submission = validate(&payload, &state.courses).map_err(|e| {
        warn!(client, field = e.field(), error = %e, "Validation error");
        RelayError::from(e)
    })?;

    state.webhook.forward(&submission).await.map_err(|e| {
        error!(client, error = %e, "Webhook delivery failed");
        RelayError::from(e)
    })?;

    info!(client, course = submission.course(), "Submission relayed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    #[test]
    fn forwarded_for_takes_first_hop() {
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "10.0.0.1"),
        ]);
        assert_eq!(client_identifier(&h), "203.0.113.7");
    }

    #[test]
    fn real_ip_is_the_fallback() {
        let h = headers(&[("x-real-ip", " 198.51.100.4 ")]);
        assert_eq!(client_identifier(&h), "198.51.100.4");

        let h = headers(&[("x-forwarded-for", ""), ("x-real-ip", "198.51.100.4")]);
        assert_eq!(client_identifier(&h), "198.51.100.4");
    }

    #[test]
    fn missing_headers_map_to_unknown() {
        assert_eq!(client_identifier(&HeaderMap::new()), UNKNOWN_CLIENT);
    }
}
