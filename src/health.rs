//! Liveness endpoint for the hosting platform, and a loop that keeps pinging it from outside so
//! the service is never scaled to zero.

use crate::{log_internal, log_warn};
use anyhow::Result;
use axum::{routing::get, Router};
use std::time::Duration;

const PING_TIMEOUT: Duration = Duration::from_secs(10);

pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}

/// Serve `GET /health` on all interfaces until the process exits.
pub async fn serve(port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log_internal!("Health check listening on http://{}/health", addr);
    axum::serve(listener, router()).await?;
    Ok(())
}

/// Hit `{base_url}/health` every `every`.  Failures are ignored.
pub async fn self_ping(base_url: String, every: Duration) {
    let url = format!("{}/health", base_url.trim_end_matches('/'));
    let client = match reqwest::Client::builder().timeout(PING_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            log_warn!("Self-ping disabled, could not build HTTP client: {}", e);
            return;
        }
    };

    log_internal!("Self-ping every {}s to {}", every.as_secs(), url);
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        ping_once(&client, &url).await;
    }
}

async fn ping_once(client: &reqwest::Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}
