mod health;
mod metrics;
mod relay;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use relay::{client_identifier, relay_handler};
