use crate::{event::*, notice, plugin::*};
use anyhow::Result;
use chrono::Utc;

pub struct AiCredits;

#[serenity::async_trait]
impl Plugin for AiCredits {
    fn name(&self) -> &'static str {
        "AI횟수"
    }

    fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.general.command_prefix;
        Some(format!(
            "{}{} - 남은 AI 사용 기회 (1회 + 순공 1시간당 1회)",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()) else {
            return Ok(EventHandled::No);
        };

        let credits = ctx
            .study
            .write()
            .await
            .ai_credits(Utc::now(), msg.author.id);

        let reply = notice::ai_credit_summary(
            msg.author.id,
            credits.remaining,
            credits.hours,
            credits.used,
        );
        msg.channel_id.say(ctx.cache_http, reply).await?;
        Ok(EventHandled::Yes)
    }
}
