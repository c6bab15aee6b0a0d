use crate::{
    effect::{self, Effect},
    event::*,
    gemini::Image,
    helper::*,
    log_internal, log_warn, notice,
    plugin::*,
};
use anyhow::Result;
use chrono::Utc;
use serenity::all::Message;

/// Answers everything posted in the AI channel, one credit per message.
pub struct AiChannel;

#[serenity::async_trait]
impl Plugin for AiChannel {
    fn name(&self) -> &'static str {
        "ai_channel"
    }

    fn usage(&self, _ctx: &Context) -> Option<String> {
        Some("AI 채널에 글이나 이미지 올리기 - AI 답변 (기회 1회 사용)".to_owned())
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::Message(msg) = event else {
            return Ok(EventHandled::No);
        };
        if msg.channel_id != ctx.cfg.ai_channel() || !msg.is_in_guild(ctx) {
            return Ok(EventHandled::No);
        }

        let content = msg.content.trim();
        if content.starts_with(&ctx.cfg.general.command_prefix) {
            return Ok(EventHandled::No);
        }
        if content.is_empty() && msg.image_attachment().is_none() {
            return Ok(EventHandled::No);
        }

        let user_id = msg.author.id;
        let platform = ctx.platform();

        // Paid up front so a second message sent while this one waits on the API can't spend
        // the same credit.
        let reserved = ctx
            .study
            .write()
            .await
            .reserve_ai_credit(Utc::now(), user_id);
        let Some(credits) = reserved else {
            let effects = vec![
                Effect::Delete {
                    channel_id: msg.channel_id,
                    message_id: msg.id,
                },
                Effect::Say {
                    channel_id: msg.channel_id,
                    content: notice::ai_out_of_credit(user_id, &ctx.cfg.general.command_prefix),
                },
            ];
            effect::apply(&platform, effects).await;
            return Ok(EventHandled::Yes);
        };

        let typing = msg.channel_id.start_typing(ctx.http);
        let image = download_image(msg).await;
        let reply = ctx.gemini.reply(content, image.as_ref()).await;
        typing.stop();

        let answer = match reply {
            Some(reply) => {
                log_internal!("AI reply for {} from {}", user_id, reply.model);
                reply.text
            }
            None => notice::AI_APOLOGY.to_owned(),
        };

        let effects = vec![
            Effect::Say {
                channel_id: msg.channel_id,
                content: answer,
            },
            Effect::Say {
                channel_id: msg.channel_id,
                content: notice::ai_credits_left(user_id, credits.remaining),
            },
        ];
        effect::apply(&platform, effects).await;

        Ok(EventHandled::Yes)
    }
}

async fn download_image(msg: &Message) -> Option<Image> {
    let attachment = msg.image_attachment()?;

    match attachment.download().await {
        Ok(data) => Some(Image {
            mime_type: attachment
                .content_type
                .clone()
                .unwrap_or_else(|| "image/jpeg".to_owned()),
            data,
        }),
        Err(e) => {
            log_warn!("Could not download {}: {}", attachment.filename, e);
            None
        }
    }
}
