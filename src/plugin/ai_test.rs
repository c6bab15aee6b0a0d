use crate::{event::*, notice, plugin::*};
use anyhow::Result;

/// Connectivity probe for the completion endpoint.  Does not spend credits.
pub struct AiTest;

#[serenity::async_trait]
impl Plugin for AiTest {
    fn name(&self) -> &'static str {
        "gemini테스트"
    }

    fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.general.command_prefix;
        Some(format!(
            "{}{} - AI 연결 테스트 (AI 채널 전용)",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()) else {
            return Ok(EventHandled::No);
        };

        if msg.channel_id != ctx.cfg.ai_channel() {
            msg.channel_id
                .say(ctx.cache_http, notice::AI_TEST_WRONG_CHANNEL)
                .await?;
            return Ok(EventHandled::Yes);
        }

        msg.channel_id
            .say(ctx.cache_http, notice::AI_TEST_STARTED)
            .await?;

        let reply = match ctx.gemini.reply(notice::AI_TEST_PROMPT, None).await {
            Some(reply) => notice::ai_test_succeeded(&reply.text),
            None => notice::AI_TEST_FAILED.to_owned(),
        };
        msg.channel_id.say(ctx.cache_http, reply).await?;
        Ok(EventHandled::Yes)
    }
}
