use crate::{event::*, plugin::*};
use anyhow::Result;

/// Bots, including this one, are never studied, gated or answered.
pub struct IgnoreBots;

#[serenity::async_trait]
impl Plugin for IgnoreBots {
    fn name(&self) -> &'static str {
        "ignore_bots"
    }

    fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, _ctx: &Context, event: &Event) -> Result<EventHandled> {
        let is_bot = match event {
            Event::Message(msg) => msg.author.bot,
            Event::VoiceStateUpdate { new, .. } => {
                new.member.as_ref().is_some_and(|member| member.user.bot)
            }
            Event::Ready(_) => false,
        };

        if is_bot {
            Ok(EventHandled::Yes)
        } else {
            Ok(EventHandled::No)
        }
    }
}
