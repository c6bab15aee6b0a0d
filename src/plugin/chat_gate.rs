use crate::{effect, event::*, helper::*, log_internal, plugin::*};
use anyhow::Result;

/// Members below quota get a handful of messages a day.  Past that, messages are removed.
pub struct ChatGate;

#[serenity::async_trait]
impl Plugin for ChatGate {
    fn name(&self) -> &'static str {
        "chat_gate"
    }

    fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };
        if !msg.is_in_guild(ctx) {
            return Ok(EventHandled::No);
        }

        let verdict = ctx
            .study
            .write()
            .await
            .gate_message(msg.author.id, msg.channel_id, msg.id);
        effect::apply(&ctx.platform(), verdict.effects).await;

        if verdict.blocked {
            log_internal!("Removed message {} over the daily chat limit", msg.id);
            Ok(EventHandled::Yes)
        } else {
            Ok(EventHandled::No)
        }
    }
}
