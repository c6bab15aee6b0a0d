use crate::{event::*, log_internal, plugin::*};
use anyhow::Result;

/// Drops messages that were already delivered to this or another bot process.
pub struct Dedup;

#[serenity::async_trait]
impl Plugin for Dedup {
    fn name(&self) -> &'static str {
        "dedup"
    }

    fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };

        if ctx.dedup.lock().await.first_sighting(msg.id).await {
            Ok(EventHandled::No)
        } else {
            log_internal!("Dropping duplicate delivery of message {}", msg.id);
            Ok(EventHandled::Yes)
        }
    }
}
