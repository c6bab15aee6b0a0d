//! Per-user study session records

use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, UserId};
use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserSession {
    /// Currently accruing time in a counted room.
    pub in_study: bool,
    pub current_channel: Option<ChannelId>,
    /// Accrual anchor.  `None` whenever the member is not accruing.
    pub last_join_at: Option<DateTime<Utc>>,
    /// Everything studied today before the quota was met.
    pub total_study_seconds: f64,
    /// Accrual of the current visit once the quota is already met.
    pub session_study_seconds: f64,
    /// `total_study_seconds` as it was on the last room entry.
    pub session_start_total_seconds: f64,
}

impl UserSession {
    /// Apply the time since the anchor and advance the anchor to `now`.
    ///
    /// This must run before anything that can suspend: a concurrent caller that observes the
    /// advanced anchor computes a zero delta instead of counting the same span twice.
    pub fn accrue(&mut self, now: DateTime<Utc>, quota_met: bool) {
        if !self.in_study {
            return;
        }
        let Some(anchor) = self.last_join_at else {
            return;
        };

        let delta = seconds_between(anchor, now);
        if delta <= 0.0 {
            return;
        }

        if quota_met {
            self.session_study_seconds += delta;
        } else {
            self.total_study_seconds += delta;
        }
        self.last_join_at = Some(now);
    }

    /// Start accruing in `channel_id`.
    pub fn enter_study(&mut self, channel_id: ChannelId, now: DateTime<Utc>, quota_met: bool) {
        self.session_start_total_seconds = self.total_study_seconds;
        if quota_met {
            self.session_study_seconds = 0.0;
        }
        self.in_study = true;
        self.current_channel = Some(channel_id);
        self.last_join_at = Some(now);
    }

    pub fn stop_study(&mut self) {
        self.in_study = false;
        self.current_channel = None;
        self.last_join_at = None;
    }

    /// Seconds studied since the last room entry.
    pub fn visit_seconds(&self, quota_met: bool) -> f64 {
        let before_quota = self.total_study_seconds - self.session_start_total_seconds;
        if quota_met {
            before_quota + self.session_study_seconds
        } else {
            before_quota
        }
    }

    /// Seconds that count against a room's quota.  After the day's quota is met every visit
    /// starts over, so only the re-entry counter matters.
    pub fn quota_seconds(&self, quota_met: bool) -> f64 {
        if quota_met {
            self.session_study_seconds
        } else {
            self.total_study_seconds
        }
    }

    /// Whole minutes left of a room limit.  `None` for rooms without one.
    pub fn remaining_minutes(&self, limit_minutes: Option<u32>, quota_met: bool) -> Option<i64> {
        limit_minutes.map(|limit| remaining_minutes(limit, self.quota_seconds(quota_met)))
    }

    pub fn total_minutes(&self) -> i64 {
        (self.total_study_seconds / 60.0).floor() as i64
    }

    pub fn total_hours(&self) -> i64 {
        (self.total_study_seconds / 3600.0).floor() as i64
    }
}

/// Whole minutes left of `limit_minutes` once `spent_seconds` are used, rounded down.
pub fn remaining_minutes(limit_minutes: u32, spent_seconds: f64) -> i64 {
    ((limit_minutes as f64 * 60.0 - spent_seconds) / 60.0).floor() as i64
}

pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Every member's session, created on first reference.
#[derive(Default)]
pub struct Ledger(HashMap<UserId, UserSession>);

impl Ledger {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn session(&mut self, user_id: UserId) -> &mut UserSession {
        self.0.entry(user_id).or_default()
    }

    pub fn get(&self, user_id: UserId) -> Option<&UserSession> {
        self.0.get(&user_id)
    }

    /// Members currently accruing, with the room the ledger believes they are in.
    pub fn studying(&self) -> Vec<(UserId, ChannelId)> {
        self.0
            .iter()
            .filter(|(_, session)| session.in_study)
            .filter_map(|(user_id, session)| session.current_channel.map(|c| (*user_id, c)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
