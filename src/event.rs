//! The Serenity crate we're using for the Discord API is designed around callbacks to handle
//! events.  However, this does not mesh well with our plugin framework here.  To resolve this,
//! the handler translates the callbacks into a distinct Event enum.

use crate::{context::Context, effect, log_warn};
use chrono::Utc;
use serenity::all::{Message, Ready, VoiceState};

/// A Discord event
pub enum Event {
    Ready(Ready),
    Message(Message),
    VoiceStateUpdate {
        old: Option<VoiceState>,
        new: VoiceState,
    },
}

impl Event {
    // When an event occurs, iterate over all the plugins to see if any can/should handle it.
    pub async fn handle(self, ctx: Context<'_>) {
        // Day rollover is only ever noticed here and in the polls, so check before any plugin
        // touches study state.
        let effects = ctx.study.write().await.maybe_reset(Utc::now());
        if !effects.is_empty() {
            effect::apply(&ctx.platform(), effects).await;
        }

        for plugin in crate::plugin::plugins() {
            match plugin.handle(&ctx, &self).await {
                Ok(EventHandled::Yes) => return,
                Ok(EventHandled::No) => continue,
                Err(err) => log_warn!("Error in plugin {}: {}", plugin.name(), err),
            }
        }
    }

    // Check if a message is the given bot command, e.g. `!순공시간`.
    //
    // Returns the message and whatever follows the command word.
    pub fn is_bot_cmd<'e>(&'e self, ctx: &Context, cmd: &str) -> Option<(&'e Message, &'e str)> {
        let Event::Message(msg) = self else {
            return None;
        };

        let rest = msg
            .content
            .trim_start()
            .strip_prefix(ctx.cfg.general.command_prefix.as_str())?;
        let (word, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));

        (word == cmd).then_some((msg, args.trim()))
    }
}

pub enum EventHandled {
    Yes,
    No,
}
