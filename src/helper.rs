//! Miscellaneous convenience methods

use crate::context::Context;
use serenity::all::{Attachment, Cache, ChannelId, GuildId, UserId};
use std::collections::HashMap;

pub trait MessageHelper {
    fn is_from_admin(&self, ctx: &Context) -> bool;
    fn is_in_guild(&self, ctx: &Context) -> bool;
    /// First attachment that is an image, if any.
    fn image_attachment(&self) -> Option<&Attachment>;
}

impl MessageHelper for serenity::all::Message {
    fn is_from_admin(&self, ctx: &Context) -> bool {
        self.author.id == ctx.cfg.admin_id()
    }

    fn is_in_guild(&self, ctx: &Context) -> bool {
        self.guild_id == Some(ctx.cfg.guild_id())
    }

    fn image_attachment(&self) -> Option<&Attachment> {
        self.attachments.iter().find(|attachment| {
            attachment
                .content_type
                .as_deref()
                .is_some_and(|mime| mime.starts_with("image/"))
        })
    }
}

pub trait CacheHelper {
    /// Voice channel of every human member currently connected in the guild.
    fn voice_snapshot(&self, guild_id: GuildId) -> HashMap<UserId, ChannelId>;
    fn voice_channel(&self, guild_id: GuildId, user_id: UserId) -> Option<ChannelId>;
}

impl CacheHelper for Cache {
    fn voice_snapshot(&self, guild_id: GuildId) -> HashMap<UserId, ChannelId> {
        // The guild reference is a cache lock; collect before letting it go.
        let Some(guild) = self.guild(guild_id) else {
            return HashMap::new();
        };

        guild
            .voice_states
            .iter()
            .filter(|(_, state)| !state.member.as_ref().is_some_and(|m| m.user.bot))
            .filter_map(|(user_id, state)| state.channel_id.map(|channel| (*user_id, channel)))
            .collect()
    }

    fn voice_channel(&self, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
        self.guild(guild_id)?
            .voice_states
            .get(&user_id)
            .and_then(|state| state.channel_id)
    }
}
