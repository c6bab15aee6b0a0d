use crate::{event::*, log_event, logging::*, plugin::*};
use anyhow::Result;

/// Prints debug information about event to stdout
pub struct Debug;

#[serenity::async_trait]
impl Plugin for Debug {
    fn name(&self) -> &'static str {
        "debug"
    }

    fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        match event {
            Event::Ready(ready) => {
                log_event!(
                    "Connected to {} server(s) as {}",
                    ready.guilds.len(),
                    ready.user.color(),
                );
            }
            Event::Message(msg) => {
                let attachments = match msg.attachments.len() {
                    0 => String::new(),
                    n => format!(" [{} attachment(s)]", n),
                };
                log_event!(
                    "{}{}{}{}{} {}{}",
                    msg.channel_id.color(ctx.cache_http).await,
                    Glue {}.color(),
                    msg.author.color(),
                    Glue {}.color(),
                    msg.id,
                    msg.content,
                    attachments,
                );
            }
            Event::VoiceStateUpdate { old, new } => {
                let old_channel_id = old.as_ref().and_then(|old| old.channel_id);
                match (old_channel_id, new.channel_id) {
                    // State change within same channel, e.g. mute/unmute
                    // Not currently debug logging this
                    (from, to) if from == to => {}
                    (Some(_), Some(_)) => log_event!(
                        "{} moved VC channel from \"{}\" to \"{}\"",
                        new.user_id.color(ctx.cache_http).await,
                        old_channel_id.color(ctx.cache_http).await,
                        new.channel_id.color(ctx.cache_http).await,
                    ),
                    (Some(_), None) => log_event!(
                        "{} left VC channel \"{}\"",
                        new.user_id.color(ctx.cache_http).await,
                        old_channel_id.color(ctx.cache_http).await,
                    ),
                    (None, Some(_)) => log_event!(
                        "{} joined VC channel \"{}\"",
                        new.user_id.color(ctx.cache_http).await,
                        new.channel_id.color(ctx.cache_http).await,
                    ),
                    (None, None) => log_event!("Unknown voice state update"),
                }
            }
        }

        Ok(EventHandled::No)
    }
}
