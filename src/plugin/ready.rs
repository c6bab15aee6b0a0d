use crate::{event::*, health, log_internal, log_warn, plugin::*, reconciler::Reconciler};
use anyhow::Result;
use std::{sync::atomic::Ordering, sync::Arc, time::Duration};

/// Starts the background tasks once the connection to Discord is ready.
///
/// The gateway emits `ready` again after a reconnect; the tasks are only spawned the first time.
pub struct Ready;

#[serenity::async_trait]
impl Plugin for Ready {
    fn name(&self) -> &'static str {
        "ready"
    }

    fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::Ready(_) = event else {
            return Ok(EventHandled::No);
        };

        if ctx.started.swap(true, Ordering::SeqCst) {
            log_internal!("Reconnected, background tasks already running");
            return Ok(EventHandled::Yes);
        }

        if ctx.gemini.is_configured() {
            log_internal!("Gemini replies enabled");
        } else {
            log_warn!("GEMINI_API_KEY is not set, AI channel will only apologize");
        }

        Reconciler::new(
            Arc::clone(ctx.cfg),
            Arc::clone(ctx.study),
            Arc::clone(ctx.cache),
            Arc::clone(ctx.http),
        )
        .spawn();

        let port = ctx.cfg.health.port;
        tokio::spawn(async move {
            if let Err(e) = health::serve(port).await {
                log_warn!("Health check server stopped: {}", e);
            }
        });

        if let Some(url) = ctx.cfg.secrets.self_ping_url.clone() {
            let every = Duration::from_secs(ctx.cfg.health.self_ping_seconds);
            tokio::spawn(health::self_ping(url, every));
        }

        Ok(EventHandled::Yes)
    }
}
