//! What each voice channel means to the study policy

use serenity::all::ChannelId;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoomKind {
    /// Counted room with a fixed daily quota.
    TimedStudy { limit_minutes: u32 },
    /// Counted room without a quota of its own.
    ///
    /// `quota_minutes` overrides that for rooms that still release members after a very long
    /// stretch.  With `stay_after_quota` the member is told they may leave but is not moved.
    UnlimitedStudy {
        quota_minutes: Option<u32>,
        stay_after_quota: bool,
    },
    Rest,
    Freedom,
    PledgeVoice,
    Other,
}

impl RoomKind {
    /// Rooms in which time accrues.
    pub fn is_counted(&self) -> bool {
        matches!(
            self,
            RoomKind::TimedStudy { .. } | RoomKind::UnlimitedStudy { .. } | RoomKind::PledgeVoice
        )
    }

    /// Quota in minutes, `None` when the room never runs out.
    pub fn limit_minutes(&self) -> Option<u32> {
        match self {
            RoomKind::TimedStudy { limit_minutes } => Some(*limit_minutes),
            RoomKind::UnlimitedStudy { quota_minutes, .. } => *quota_minutes,
            _ => None,
        }
    }
}

/// Static channel-to-role mapping, built once from configuration.
#[derive(Clone, Debug)]
pub struct RoomTable {
    rooms: HashMap<ChannelId, RoomKind>,
    freedom: ChannelId,
    rest: ChannelId,
    rest_overflow: ChannelId,
    pledge_voice: ChannelId,
}

impl RoomTable {
    pub fn new(
        freedom: ChannelId,
        rest: ChannelId,
        rest_overflow: ChannelId,
        pledge_voice: ChannelId,
        study: impl IntoIterator<Item = (ChannelId, RoomKind)>,
    ) -> Self {
        let mut rooms: HashMap<ChannelId, RoomKind> = study.into_iter().collect();
        rooms.insert(freedom, RoomKind::Freedom);
        rooms.insert(rest, RoomKind::Rest);
        rooms.insert(pledge_voice, RoomKind::PledgeVoice);

        Self {
            rooms,
            freedom,
            rest,
            rest_overflow,
            pledge_voice,
        }
    }

    pub fn classify(&self, channel_id: Option<ChannelId>) -> RoomKind {
        channel_id
            .and_then(|id| self.rooms.get(&id).copied())
            .unwrap_or(RoomKind::Other)
    }

    pub fn freedom(&self) -> ChannelId {
        self.freedom
    }

    pub fn rest(&self) -> ChannelId {
        self.rest
    }

    /// Where members lingering in the rest room get sent.
    pub fn rest_overflow(&self) -> ChannelId {
        self.rest_overflow
    }

    pub fn pledge_voice(&self) -> ChannelId {
        self.pledge_voice
    }
}
