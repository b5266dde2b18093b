use std::sync::Arc;

use crate::config::{CourseSet, RelayConfig};
use crate::rate_limit::QuotaStore;
use crate::upstream::WebhookClient;

// app's shared state
pub struct AppState {
    pub webhook: WebhookClient,
    pub courses: CourseSet,
    pub quota: Option<Arc<dyn QuotaStore>>, // None -> no rate limiting
}

impl AppState {
    pub fn new(
        client: reqwest::Client,
        config: &RelayConfig,
        quota: Option<Arc<dyn QuotaStore>>,
    ) -> Self {
        Self {
            webhook: WebhookClient::new(
                client,
                config.webhook_url.clone(),
                config.upstream_timeout,
            ),
            courses: config.courses.clone(),
            quota,
        }
    }
}
