use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, register_counter, register_counter_vec, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("relay_requests_total", "Total number of relay requests").unwrap();
    pub static ref OUTCOMES: CounterVec = register_counter_vec!(
        "relay_outcomes_total",
        "Relay requests by terminal outcome",
        &["outcome"]
    )
    .unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "relay_upstream_latency_seconds",
        "Webhook call latency in seconds"
    )
    .unwrap();
    pub static ref RATE_WINDOWS: Gauge =
        register_gauge!("relay_rate_windows", "Client rate windows currently tracked").unwrap();
}

pub fn record_outcome(outcome: &str) {
    OUTCOMES.with_label_values(&[outcome]).inc();
}
