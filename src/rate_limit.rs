use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info};

use crate::config::QuotaConfig;
use crate::metrics::RATE_WINDOWS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed { remaining: u32 },
    Exceeded { retry_after: Duration },
}

// Per-client quota bookkeeping. Kept behind a trait so a shared store
// can replace the in-process map for multi-instance deployments.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    // Record a request from `client` at `now`, unless the ceiling is reached
    async fn check(&self, client: &str, now: Instant) -> QuotaDecision;

    // Prune expired hits everywhere and forget idle clients.
    // Returns how many clients were forgotten.
    async fn sweep(&self, now: Instant) -> usize;
}

// Sliding window of request instants for one client
#[derive(Debug, Default)]
pub struct RateWindow {
    hits: VecDeque<Instant>,
}

impl RateWindow {
    // drop hits whose age is >= window
    pub fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.hits.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

pub struct InMemoryQuotaStore {
    windows: DashMap<String, RateWindow>,
    limit: u32,
    window: Duration,
}

impl InMemoryQuotaStore {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window,
        }
    }

    pub fn from_config(config: &QuotaConfig) -> Self {
        Self::new(config.limit, config.window)
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn check(&self, client: &str, now: Instant) -> QuotaDecision {
        let decision = {
            // entry guard holds the shard lock: prune + append is atomic per client
            let mut entry = self.windows.entry(client.to_string()).or_default();
            entry.prune(now, self.window);

            let used = u32::try_from(entry.len()).unwrap_or(u32::MAX);
            if used >= self.limit {
                QuotaDecision::Exceeded {
                    retry_after: self.window,
                }
            } else {
                entry.hits.push_back(now);
                QuotaDecision::Allowed {
                    remaining: self.limit - used - 1,
                }
            }
        };

        RATE_WINDOWS.set(self.windows.len() as f64);
        decision
    }

    async fn sweep(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, w| {
            w.prune(now, self.window);
            !w.is_empty()
        });
        let after = self.windows.len();

        RATE_WINDOWS.set(after as f64);
        before.saturating_sub(after)
    }
}

// Periodic sweeper, runs for the process lifetime
pub async fn window_sweeper(store: Arc<dyn QuotaStore>, every: Duration) {
    let mut interval = interval(every);

    info!(interval = ?every, "Rate window sweeper started");

    loop {
        interval.tick().await;

        let forgotten = store.sweep(Instant::now()).await;
        if forgotten > 0 {
            debug!(forgotten, "Swept idle rate windows");
        }
    }
}
