use reqwest::{StatusCode, Url};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use crate::metrics::UPSTREAM_LATENCY;
use crate::models::Submission;

// upstream bodies are only logged, keep them short
const MAX_LOGGED_BODY: usize = 512;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("webhook timed out after {0:?}")]
    Timeout(Duration),

    #[error("webhook request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("webhook failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

// Client for the destination webhook
pub struct WebhookClient {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl WebhookClient {
    pub fn new(client: reqwest::Client, url: Url, timeout: Duration) -> Self {
        Self {
            client,
            url,
            timeout,
        }
    }

    // POST the submission once. No retries: a failure is reported to the
    // caller and the submission is dropped.
    pub async fn forward(&self, submission: &Submission) -> Result<(), UpstreamError> {
        let start = Instant::now();

        let result = self
            .client
            .post(self.url.clone())
            .timeout(self.timeout)
            .json(submission)
            .send()
            .await;

        UPSTREAM_LATENCY.observe(start.elapsed().as_secs_f64());

        let res = result.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout(self.timeout)
            } else {
                UpstreamError::Transport(e)
            }
        })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status,
                body: truncate(body, MAX_LOGGED_BODY),
            });
        }

        debug!(%status, elapsed = ?start.elapsed(), "Webhook accepted submission");
        Ok(())
    }
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut cut = max;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push('…');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short".to_string(), 10), "short");
        assert_eq!(truncate("abcdef".to_string(), 3), "abc…");
        // "ш" is two bytes, cutting at 3 would split the second one
        assert_eq!(truncate("шшш".to_string(), 3), "ш…");
    }
}
