//! Side effects requested by the study policy, and the port that carries them out
//!
//! The policy core never talks to Discord.  It returns a list of [`Effect`]s which the caller
//! executes through a [`Platform`] once all state has been updated.  Every effect is
//! best-effort: a failure is logged and the remaining effects still run.

use crate::log_warn;
use serenity::all::{ChannelId, MessageId, RoleId, UserId};

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Server mute or unmute a member.
    Mute { user_id: UserId, mute: bool },
    /// Move a member to another voice channel.
    Move {
        user_id: UserId,
        channel_id: ChannelId,
    },
    /// Post in the notice channel.
    Notice(String),
    /// Post in a specific channel.
    Say {
        channel_id: ChannelId,
        content: String,
    },
    Delete {
        channel_id: ChannelId,
        message_id: MessageId,
    },
    GrantRole { user_id: UserId, role_id: RoleId },
    RevokeRole { user_id: UserId, role_id: RoleId },
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("missing permission")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Other(String),
}

/// Capabilities the policy needs from the chat platform.
#[serenity::async_trait]
pub trait Platform: Sync + Send {
    async fn set_mute(&self, user_id: UserId, mute: bool) -> Result<(), PlatformError>;
    async fn move_member(&self, user_id: UserId, channel_id: ChannelId)
        -> Result<(), PlatformError>;
    async fn notify(&self, content: &str) -> Result<(), PlatformError>;
    async fn say(&self, channel_id: ChannelId, content: &str) -> Result<(), PlatformError>;
    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), PlatformError>;
    async fn grant_role(&self, user_id: UserId, role_id: RoleId) -> Result<(), PlatformError>;
    async fn revoke_role(&self, user_id: UserId, role_id: RoleId) -> Result<(), PlatformError>;
}

/// Run effects in order.  Returns how many failed.
pub async fn apply(platform: &dyn Platform, effects: Vec<Effect>) -> usize {
    let mut failed = 0;

    for effect in effects {
        let result = match &effect {
            Effect::Mute { user_id, mute } => platform.set_mute(*user_id, *mute).await,
            Effect::Move {
                user_id,
                channel_id,
            } => platform.move_member(*user_id, *channel_id).await,
            Effect::Notice(content) => platform.notify(content).await,
            Effect::Say {
                channel_id,
                content,
            } => platform.say(*channel_id, content).await,
            Effect::Delete {
                channel_id,
                message_id,
            } => platform.delete_message(*channel_id, *message_id).await,
            Effect::GrantRole { user_id, role_id } => platform.grant_role(*user_id, *role_id).await,
            Effect::RevokeRole { user_id, role_id } => {
                platform.revoke_role(*user_id, *role_id).await
            }
        };

        match result {
            Ok(()) => {}
            // Already gone, nothing to report.
            Err(PlatformError::NotFound) if matches!(effect, Effect::Delete { .. }) => {}
            Err(err) => {
                failed += 1;
                log_warn!("{:?} failed: {}", effect, err);
            }
        }
    }

    failed
}
