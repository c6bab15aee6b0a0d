use crate::{event::*, notice, plugin::*};
use anyhow::Result;
use chrono::Utc;

/// Today's accrued study time, with commentary.
pub struct StudyTime;

#[serenity::async_trait]
impl Plugin for StudyTime {
    fn name(&self) -> &'static str {
        "순공시간"
    }

    fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.general.command_prefix;
        Some(format!("{}{} - 오늘 순공 시간", prefix, self.name()))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()) else {
            return Ok(EventHandled::No);
        };

        let minutes = ctx
            .study
            .write()
            .await
            .study_minutes(Utc::now(), msg.author.id);

        msg.channel_id
            .say(
                ctx.cache_http,
                notice::study_time_reply(msg.author.id, minutes),
            )
            .await?;
        Ok(EventHandled::Yes)
    }
}
