use crate::{event::*, helper::*, log_internal, notice, plugin::*};
use anyhow::Result;
use chrono::Utc;
use serenity::all::UserId;

/// Admin-only: hand out extra AI credits for today.
pub struct AiGrant;

#[serenity::async_trait]
impl Plugin for AiGrant {
    fn name(&self) -> &'static str {
        "AI충전"
    }

    fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = &ctx.cfg.general.command_prefix;
        Some(format!(
            "{}{} @사용자 횟수 - AI 사용 기회 충전 (관리자 전용)",
            prefix,
            self.name()
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()) else {
            return Ok(EventHandled::No);
        };

        if !msg.is_from_admin(ctx) {
            msg.channel_id.say(ctx.cache_http, notice::ADMIN_ONLY).await?;
            return Ok(EventHandled::Yes);
        }

        let Some((target, count)) = parse_grant(args) else {
            let usage = notice::ai_grant_usage(&ctx.cfg.general.command_prefix);
            msg.channel_id.say(ctx.cache_http, usage).await?;
            return Ok(EventHandled::Yes);
        };

        let remaining = {
            let mut study = ctx.study.write().await;
            study.grant_ai_credits(target, count);
            study.ai_credits(Utc::now(), target).remaining
        };
        log_internal!("Granted {} AI credit(s) to {}", count, target);

        msg.channel_id
            .say(
                ctx.cache_http,
                notice::ai_credits_granted(target, count, remaining),
            )
            .await?;
        Ok(EventHandled::Yes)
    }
}

/// `<@123> 3` or `<@!123> 3`.  The count must be positive.
fn parse_grant(args: &str) -> Option<(UserId, u32)> {
    let mut words = args.split_whitespace();
    let mention = words.next()?;
    let count: u32 = words.next()?.parse().ok()?;
    if count == 0 || words.next().is_some() {
        return None;
    }

    let id: u64 = mention
        .strip_prefix("<@")?
        .strip_suffix('>')?
        .trim_start_matches('!')
        .parse()
        .ok()?;
    if id == 0 {
        return None;
    }

    Some((UserId::new(id), count))
}
