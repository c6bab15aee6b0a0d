//! Serenity implementation of the [`Platform`] port

use crate::effect::{Platform, PlatformError};
use serenity::{
    all::{ChannelId, EditMember, GuildId, Http, MessageId, RoleId, UserId},
    http::HttpError,
};
use std::sync::Arc;

const ROLE_AUDIT_REASON: &str = "daily chat limit";

pub struct DiscordPlatform {
    http: Arc<Http>,
    guild_id: GuildId,
    notice_channel: ChannelId,
}

impl DiscordPlatform {
    pub fn new(http: Arc<Http>, guild_id: GuildId, notice_channel: ChannelId) -> Self {
        Self {
            http,
            guild_id,
            notice_channel,
        }
    }
}

/// Sort a serenity error into the cases callers treat differently.
fn classify(err: serenity::Error) -> PlatformError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &err {
        match response.status_code.as_u16() {
            403 => return PlatformError::Forbidden,
            404 => return PlatformError::NotFound,
            _ => {}
        }
    }
    PlatformError::Other(err.to_string())
}

#[serenity::async_trait]
impl Platform for DiscordPlatform {
    async fn set_mute(&self, user_id: UserId, mute: bool) -> Result<(), PlatformError> {
        self.guild_id
            .edit_member(&self.http, user_id, EditMember::new().mute(mute))
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn move_member(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<(), PlatformError> {
        self.guild_id
            .move_member(&self.http, user_id, channel_id)
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn notify(&self, content: &str) -> Result<(), PlatformError> {
        self.say(self.notice_channel, content).await
    }

    async fn say(&self, channel_id: ChannelId, content: &str) -> Result<(), PlatformError> {
        channel_id
            .say(&self.http, content)
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), PlatformError> {
        channel_id
            .delete_message(&self.http, message_id)
            .await
            .map_err(classify)
    }

    async fn grant_role(&self, user_id: UserId, role_id: RoleId) -> Result<(), PlatformError> {
        self.http
            .add_member_role(self.guild_id, user_id, role_id, Some(ROLE_AUDIT_REASON))
            .await
            .map_err(classify)
    }

    async fn revoke_role(&self, user_id: UserId, role_id: RoleId) -> Result<(), PlatformError> {
        self.http
            .remove_member_role(self.guild_id, user_id, role_id, Some(ROLE_AUDIT_REASON))
            .await
            .map_err(classify)
    }
}
