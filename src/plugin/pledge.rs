use crate::{duration, effect, event::*, helper::*, plugin::*};
use anyhow::Result;
use chrono::Utc;

/// `2시간` / `90분` in the pledge channel declares today's pledge.
pub struct Pledge;

#[serenity::async_trait]
impl Plugin for Pledge {
    fn name(&self) -> &'static str {
        "pledge"
    }

    fn usage(&self, _ctx: &Context) -> Option<String> {
        Some("다짐 채널에 `2시간`, `1시간 30분`처럼 적기 - 목표 시간 다짐 후 다짐방 이동".to_owned())
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };
        if msg.channel_id != ctx.cfg.pledge_channel() || !msg.is_in_guild(ctx) {
            return Ok(EventHandled::No);
        }
        if msg.content.trim_start().starts_with(&ctx.cfg.general.command_prefix) {
            return Ok(EventHandled::No);
        }
        let Some(minutes) = duration::parse_minutes(&msg.content) else {
            return Ok(EventHandled::No);
        };

        let voice = ctx.cache.voice_channel(ctx.cfg.guild_id(), msg.author.id);
        let effects = ctx.study.write().await.declare_pledge(
            Utc::now(),
            msg.author.id,
            msg.channel_id,
            minutes,
            voice,
        );
        effect::apply(&ctx.platform(), effects).await;

        Ok(EventHandled::Yes)
    }
}
