use anyhow::Context;
use clap::Parser; // for cli
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use contact_relay::config::Args;
use contact_relay::rate_limit::{InMemoryQuotaStore, QuotaStore, window_sweeper};
use contact_relay::router;
use contact_relay::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // parse cli arguments
    let args = Args::parse();
    let config = args.relay_config();

    // spawn the sweeper only when quotas are enforced
    let quota: Option<Arc<dyn QuotaStore>> = match &config.quota {
        Some(q) => {
            let store: Arc<dyn QuotaStore> = Arc::new(InMemoryQuotaStore::from_config(q));
            tokio::spawn(window_sweeper(Arc::clone(&store), q.sweep_interval));
            Some(store)
        }
        None => {
            warn!("Rate limiting disabled");
            None
        }
    };

    let client = reqwest::Client::builder()
        .build()
        .context("failed to build http client")?;
    let state = Arc::new(AppState::new(client, &config, quota));

    let app = router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "Relay listening");
    info!(webhook = %config.webhook_url.host_str().unwrap_or("?"), "Forwarding submissions");
    info!(courses = %config.courses, timeout = ?config.upstream_timeout, "Validation settings");
    if let Some(q) = &config.quota {
        info!(limit = q.limit, window = ?q.window, "Rate limit");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
