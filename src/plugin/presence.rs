use crate::{effect, event::*, plugin::*};
use anyhow::Result;
use chrono::Utc;

/// Feeds voice channel changes into the study policy.
pub struct Presence;

#[serenity::async_trait]
impl Plugin for Presence {
    fn name(&self) -> &'static str {
        "presence"
    }

    fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::VoiceStateUpdate { old, new } = event else {
            return Ok(EventHandled::No);
        };
        if new.guild_id != Some(ctx.cfg.guild_id()) {
            return Ok(EventHandled::No);
        }

        let old_channel_id = old.as_ref().and_then(|old| old.channel_id);

        // State is settled before the lock is released; the effects can take their time.
        let effects = ctx.study.write().await.voice_transition(
            Utc::now(),
            new.user_id,
            old_channel_id,
            new.channel_id,
        );
        effect::apply(&ctx.platform(), effects).await;

        Ok(EventHandled::Yes)
    }
}
