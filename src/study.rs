//! The study policy
//!
//! [`StudyService`] owns every piece of per-day state: the session ledger, quota completion,
//! chat counters, AI usage, rest-room tracking and pledges.  All operations are synchronous and
//! take the current instant explicitly.  They mutate state first and hand back the platform
//! [`Effect`]s to perform afterwards, so no state change ever waits on Discord.

use crate::{
    clock::DayClock,
    effect::Effect,
    ledger::{remaining_minutes, seconds_between, Ledger, UserSession},
    notice,
    rooms::{RoomKind, RoomTable},
};
use chrono::{DateTime, Utc};
use serenity::all::{ChannelId, MessageId, RoleId, UserId};
use std::collections::{HashMap, HashSet};

/// Policy knobs, derived from configuration.
#[derive(Clone, Debug)]
pub struct Policy {
    pub rooms: RoomTable,
    pub utc_offset_hours: i32,
    /// Messages a member below quota may send per day.
    pub chat_limit: u32,
    pub chat_restricted_role: Option<RoleId>,
    /// Rest-room warning thresholds in minutes, ascending.
    pub rest_warning_minutes: Vec<u32>,
    pub rest_force_move_minutes: u32,
}

/// Verdict of the chat gate for a single message.
#[derive(Debug, Default)]
pub struct ChatVerdict {
    /// The message was over the limit and is being removed.
    pub blocked: bool,
    pub effects: Vec<Effect>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AiCredits {
    /// Whole hours studied today.
    pub hours: i64,
    /// Credits used today, net of admin grants.
    pub used: i64,
    pub remaining: i64,
}

pub struct StudyService {
    policy: Policy,
    clock: DayClock,
    ledger: Ledger,
    completed_quota: HashSet<UserId>,
    message_count: HashMap<UserId, u32>,
    ai_usage: HashMap<UserId, i64>,
    /// Last whole-hour count for which a credit notice went out.
    ai_charged_hour: HashMap<UserId, i64>,
    rest_entered_at: HashMap<UserId, DateTime<Utc>>,
    /// Warning thresholds already sent during the current rest visit.
    rest_warned: HashMap<UserId, HashSet<u32>>,
    rest_visits: HashMap<UserId, u32>,
    rest_total_seconds: HashMap<UserId, f64>,
    pledge_target_minutes: HashMap<UserId, u32>,
    /// Pledge progress from finished visits.  Survives leaving the room.
    pledge_completed_seconds: HashMap<UserId, f64>,
    /// Start of the pledge time being earned in the current counted-room visit.
    pledge_entered_at: HashMap<UserId, DateTime<Utc>>,
    restricted_chat: HashSet<UserId>,
}

impl StudyService {
    pub fn new(policy: Policy) -> Self {
        Self {
            clock: DayClock::new(policy.utc_offset_hours),
            policy,
            ledger: Ledger::new(),
            completed_quota: HashSet::new(),
            message_count: HashMap::new(),
            ai_usage: HashMap::new(),
            ai_charged_hour: HashMap::new(),
            rest_entered_at: HashMap::new(),
            rest_warned: HashMap::new(),
            rest_visits: HashMap::new(),
            rest_total_seconds: HashMap::new(),
            pledge_target_minutes: HashMap::new(),
            pledge_completed_seconds: HashMap::new(),
            pledge_entered_at: HashMap::new(),
            restricted_chat: HashSet::new(),
        }
    }

    pub fn rooms(&self) -> &RoomTable {
        &self.policy.rooms
    }

    pub fn session(&self, user_id: UserId) -> Option<&UserSession> {
        self.ledger.get(user_id)
    }

    pub fn is_quota_complete(&self, user_id: UserId) -> bool {
        self.completed_quota.contains(&user_id)
    }

    //
    // Day rollover
    //

    /// Wipe everything if the service day changed since the last call.  The first call only
    /// records the day.
    pub fn maybe_reset(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        if self.clock.roll(now) {
            self.reset_day()
        } else {
            Vec::new()
        }
    }

    /// Clear all per-day state at once.  Returns the role revocations for members whose chat
    /// was restricted.
    ///
    /// Members still sitting in a study or rest room lose their session with it.  They start
    /// accruing again, and get rest warnings again, from their next room entry.
    pub fn reset_day(&mut self) -> Vec<Effect> {
        self.ledger.clear();
        self.completed_quota.clear();
        self.message_count.clear();
        self.ai_usage.clear();
        self.ai_charged_hour.clear();
        self.rest_entered_at.clear();
        self.rest_warned.clear();
        self.rest_visits.clear();
        self.rest_total_seconds.clear();
        self.pledge_target_minutes.clear();
        self.pledge_completed_seconds.clear();
        self.pledge_entered_at.clear();

        let restricted = std::mem::take(&mut self.restricted_chat);
        match self.policy.chat_restricted_role {
            Some(role_id) => restricted
                .into_iter()
                .map(|user_id| Effect::RevokeRole { user_id, role_id })
                .collect(),
            None => Vec::new(),
        }
    }

    //
    // Presence
    //

    /// React to a member moving between voice channels.  `None` means not in voice.
    pub fn voice_transition(
        &mut self,
        now: DateTime<Utc>,
        user_id: UserId,
        old: Option<ChannelId>,
        new: Option<ChannelId>,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();

        // Mute/deafen toggles arrive as voice updates too.
        if old == new {
            return effects;
        }

        let quota_met = self.is_quota_complete(user_id);
        self.ledger.session(user_id).accrue(now, quota_met);

        let old_kind = self.policy.rooms.classify(old);
        if old_kind == RoomKind::Rest {
            self.leave_rest(now, user_id, &mut effects);
        }
        if old_kind.is_counted() && self.ledger.session(user_id).in_study {
            self.leave_study(now, user_id, old_kind, &mut effects);
        }

        let Some(new) = new else {
            self.ledger.session(user_id).stop_study();
            return effects;
        };

        match self.policy.rooms.classify(Some(new)) {
            RoomKind::Rest => self.enter_rest(now, user_id, &mut effects),
            RoomKind::Freedom => {
                self.ledger.session(user_id).stop_study();
                if self.is_quota_complete(user_id) {
                    effects.push(Effect::Mute {
                        user_id,
                        mute: false,
                    });
                    effects.push(Effect::Notice(notice::freedom_earned(user_id)));
                } else {
                    effects.push(Effect::Mute {
                        user_id,
                        mute: true,
                    });
                    effects.push(Effect::Notice(notice::freedom_unearned(user_id)));
                }
            }
            RoomKind::PledgeVoice => self.enter_pledge_room(now, user_id, new, &mut effects),
            kind @ (RoomKind::TimedStudy { .. } | RoomKind::UnlimitedStudy { .. }) => {
                self.enter_study_room(now, user_id, new, kind, &mut effects)
            }
            RoomKind::Other => {
                self.ledger.session(user_id).stop_study();
                effects.push(Effect::Mute {
                    user_id,
                    mute: false,
                });
            }
        }

        effects
    }

    fn leave_rest(&mut self, now: DateTime<Utc>, user_id: UserId, effects: &mut Vec<Effect>) {
        self.rest_warned.remove(&user_id);
        let Some(entered) = self.rest_entered_at.remove(&user_id) else {
            return;
        };

        let visit = seconds_between(entered, now).max(0.0);
        let total = self.rest_total_seconds.entry(user_id).or_insert(0.0);
        *total += visit;

        effects.push(Effect::Notice(notice::rest_departure(
            user_id,
            whole_minutes(visit),
            whole_minutes(*total),
        )));
    }

    fn leave_study(
        &mut self,
        now: DateTime<Utc>,
        user_id: UserId,
        kind: RoomKind,
        effects: &mut Vec<Effect>,
    ) {
        let quota_met = self.is_quota_complete(user_id);
        let pledge_anchor = self.pledge_entered_at.get(&user_id).copied();
        let session = self.ledger.session(user_id);

        let visit = match (kind, pledge_anchor) {
            (RoomKind::PledgeVoice, Some(entered)) => seconds_between(entered, now).max(0.0),
            _ => session.visit_seconds(quota_met),
        };
        let today = session.total_minutes();
        session.stop_study();

        effects.push(Effect::Notice(notice::study_departure(
            user_id,
            whole_minutes(visit),
            today,
        )));

        self.settle_pledge_visit(now, user_id, effects);
    }

    fn enter_rest(&mut self, now: DateTime<Utc>, user_id: UserId, effects: &mut Vec<Effect>) {
        self.ledger.session(user_id).stop_study();
        self.rest_entered_at.insert(user_id, now);
        self.rest_warned.insert(user_id, HashSet::new());

        let visits = self.rest_visits.entry(user_id).or_insert(0);
        *visits += 1;
        let visits = *visits;
        let rest_total = self
            .rest_total_seconds
            .get(&user_id)
            .copied()
            .unwrap_or(0.0);

        effects.push(Effect::Mute {
            user_id,
            mute: false,
        });
        effects.push(Effect::Notice(notice::rest_entry(
            user_id,
            visits,
            whole_minutes(rest_total),
        )));
    }

    fn enter_pledge_room(
        &mut self,
        now: DateTime<Utc>,
        user_id: UserId,
        channel_id: ChannelId,
        effects: &mut Vec<Effect>,
    ) {
        effects.push(Effect::Mute {
            user_id,
            mute: true,
        });

        if !self.pledge_target_minutes.contains_key(&user_id) {
            self.ledger.session(user_id).stop_study();
            effects.push(Effect::Notice(notice::pledge_rejected(user_id)));
            return;
        }

        let quota_met = self.is_quota_complete(user_id);
        self.ledger
            .session(user_id)
            .enter_study(channel_id, now, quota_met);
        self.pledge_entered_at.insert(user_id, now);

        let remaining = self.pledge_remaining_minutes(now, user_id).unwrap_or(0);
        effects.push(Effect::Notice(notice::pledge_remaining(user_id, remaining)));
    }

    fn enter_study_room(
        &mut self,
        now: DateTime<Utc>,
        user_id: UserId,
        channel_id: ChannelId,
        kind: RoomKind,
        effects: &mut Vec<Effect>,
    ) {
        let quota_met = self.is_quota_complete(user_id);
        let session = self.ledger.session(user_id);
        session.enter_study(channel_id, now, quota_met);
        let used = session.total_minutes();
        let remaining = session.remaining_minutes(kind.limit_minutes(), quota_met);

        if self.pledge_target_minutes.contains_key(&user_id) {
            self.pledge_entered_at.insert(user_id, now);
        }

        effects.push(Effect::Mute {
            user_id,
            mute: true,
        });

        // An active pledge's clock is what counts, not this room's.
        if let Some(pledge_remaining) = self.pledge_remaining_minutes(now, user_id) {
            effects.push(Effect::Notice(notice::pledge_priority(
                user_id,
                pledge_remaining,
            )));
            return;
        }

        let content = match kind {
            RoomKind::TimedStudy { .. } => {
                let remaining = remaining.unwrap_or(0);
                let mut content = notice::study_entry_finite(user_id, used, remaining);
                if remaining <= 0 {
                    content.push_str(&notice::study_entry_time_up());
                }
                content
            }
            RoomKind::UnlimitedStudy {
                stay_after_quota: true,
                ..
            } => notice::study_entry_unlimited_mute(user_id),
            _ => notice::study_entry_long(user_id, used),
        };
        effects.push(Effect::Notice(content));
    }

    //
    // Reconciliation
    //

    /// Quota poll.  `voice` maps members to the voice channel they are actually in.
    pub fn quota_tick(
        &mut self,
        now: DateTime<Utc>,
        voice: &HashMap<UserId, ChannelId>,
    ) -> Vec<Effect> {
        let mut effects = self.maybe_reset(now);

        for (user_id, _) in self.ledger.studying() {
            let Some(&channel_id) = voice.get(&user_id) else {
                continue;
            };
            let kind = self.policy.rooms.classify(Some(channel_id));
            if !kind.is_counted() {
                continue;
            }

            let quota_met = self.is_quota_complete(user_id);
            let session = self.ledger.session(user_id);
            session.accrue(now, quota_met);
            let hours = session.total_hours();
            let total_seconds = session.total_study_seconds;
            let remaining = session.remaining_minutes(kind.limit_minutes(), quota_met);

            let announced = self.ai_charged_hour.entry(user_id).or_insert(0);
            if hours > *announced {
                *announced = hours;
                effects.push(Effect::Notice(notice::ai_credit_charged(user_id)));
            }

            match kind {
                RoomKind::PledgeVoice => {
                    let Some(remaining) = self.pledge_remaining_minutes(now, user_id) else {
                        continue;
                    };
                    if remaining <= 0 {
                        let target = self.pledge_target_minutes.get(&user_id).copied();
                        self.clear_pledge(user_id);
                        let content = match target {
                            Some(target) => notice::pledge_fulfilled(user_id, target),
                            None => notice::quota_done(user_id),
                        };
                        self.release_to_freedom(user_id, content, &mut effects);
                    }
                }
                RoomKind::UnlimitedStudy {
                    quota_minutes: Some(quota),
                    stay_after_quota: true,
                } => {
                    if !quota_met && remaining_minutes(quota, total_seconds) <= 0 {
                        self.complete_quota(user_id, &mut effects);
                        effects.push(Effect::Notice(notice::quota_may_leave(user_id)));
                    }
                }
                _ => {
                    if matches!(remaining, Some(remaining) if remaining <= 0) {
                        // The move's voice update finds the member no longer studying.
                        self.settle_pledge_visit(now, user_id, &mut effects);
                        self.release_to_freedom(user_id, notice::quota_done(user_id), &mut effects);
                    }
                }
            }
        }

        effects
    }

    /// Rest poll: warn members lingering in the rest room, then drag them to a long room.
    pub fn rest_tick(
        &mut self,
        now: DateTime<Utc>,
        voice: &HashMap<UserId, ChannelId>,
    ) -> Vec<Effect> {
        let mut effects = self.maybe_reset(now);
        let rest = self.policy.rooms.rest();
        let overflow = self.policy.rooms.rest_overflow();

        let resting: Vec<(UserId, DateTime<Utc>)> = self
            .rest_entered_at
            .iter()
            .map(|(user_id, entered)| (*user_id, *entered))
            .collect();

        for (user_id, entered) in resting {
            if voice.get(&user_id) != Some(&rest) {
                continue;
            }

            let elapsed = seconds_between(entered, now).max(0.0);
            let elapsed_minutes = whole_minutes(elapsed);

            if elapsed_minutes >= self.policy.rest_force_move_minutes as i64 {
                self.rest_entered_at.remove(&user_id);
                self.rest_warned.remove(&user_id);
                *self.rest_total_seconds.entry(user_id).or_insert(0.0) += elapsed;

                effects.push(Effect::Move {
                    user_id,
                    channel_id: overflow,
                });
                effects.push(Effect::Notice(notice::rest_forced_move(user_id)));
                continue;
            }

            let Some(&threshold) = self
                .policy
                .rest_warning_minutes
                .iter()
                .rev()
                .find(|&&minutes| elapsed_minutes >= minutes as i64)
            else {
                continue;
            };

            let warned = self.rest_warned.entry(user_id).or_default();
            if warned.contains(&threshold) {
                continue;
            }
            // A skipped lower threshold is stale by now; never send it late.
            warned.extend(
                self.policy
                    .rest_warning_minutes
                    .iter()
                    .filter(|&&minutes| minutes <= threshold),
            );
            effects.push(Effect::Notice(notice::rest_warning(user_id, threshold)));
        }

        effects
    }

    fn release_to_freedom(&mut self, user_id: UserId, content: String, effects: &mut Vec<Effect>) {
        self.complete_quota(user_id, effects);
        self.ledger.session(user_id).stop_study();

        effects.push(Effect::Move {
            user_id,
            channel_id: self.policy.rooms.freedom(),
        });
        effects.push(Effect::Mute {
            user_id,
            mute: false,
        });
        effects.push(Effect::Notice(content));
    }

    /// Mark the day's quota as met and lift any chat restriction.
    fn complete_quota(&mut self, user_id: UserId, effects: &mut Vec<Effect>) {
        self.completed_quota.insert(user_id);
        // Accrual switches to the re-entry counter from here on.
        self.ledger.session(user_id).session_study_seconds = 0.0;

        if self.restricted_chat.remove(&user_id) {
            if let Some(role_id) = self.policy.chat_restricted_role {
                effects.push(Effect::RevokeRole { user_id, role_id });
            }
        }
    }

    //
    // Pledges
    //

    /// Whole minutes left on the member's pledge, counting the visit in progress.
    pub fn pledge_remaining_minutes(&self, now: DateTime<Utc>, user_id: UserId) -> Option<i64> {
        let target = *self.pledge_target_minutes.get(&user_id)?;
        let completed = self
            .pledge_completed_seconds
            .get(&user_id)
            .copied()
            .unwrap_or(0.0);
        let current = self
            .pledge_entered_at
            .get(&user_id)
            .map(|entered| seconds_between(*entered, now).max(0.0))
            .unwrap_or(0.0);

        Some(remaining_minutes(target, completed + current))
    }

    /// Fold the pledge time earned since the visit's anchor into the member's progress and
    /// fulfil the pledge once it reaches the target.
    fn settle_pledge_visit(
        &mut self,
        now: DateTime<Utc>,
        user_id: UserId,
        effects: &mut Vec<Effect>,
    ) {
        let Some(entered) = self.pledge_entered_at.remove(&user_id) else {
            return;
        };
        let Some(&target) = self.pledge_target_minutes.get(&user_id) else {
            return;
        };
        let completed = self.pledge_completed_seconds.entry(user_id).or_insert(0.0);
        *completed += seconds_between(entered, now).max(0.0);

        if remaining_minutes(target, *completed) <= 0 {
            self.clear_pledge(user_id);
            effects.push(Effect::Notice(notice::pledge_fulfilled(user_id, target)));
            self.complete_quota(user_id, effects);
        }
    }

    fn clear_pledge(&mut self, user_id: UserId) {
        self.pledge_target_minutes.remove(&user_id);
        self.pledge_completed_seconds.remove(&user_id);
        self.pledge_entered_at.remove(&user_id);
    }

    /// A member declared `minutes` in the pledge channel.  `voice` is the voice channel they
    /// are currently in.
    pub fn declare_pledge(
        &mut self,
        now: DateTime<Utc>,
        user_id: UserId,
        reply_channel: ChannelId,
        minutes: u32,
        voice: Option<ChannelId>,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        let say = |content: String| Effect::Say {
            channel_id: reply_channel,
            content,
        };

        let Some(voice) = voice else {
            effects.push(say(notice::pledge_needs_voice(user_id)));
            return effects;
        };

        if let Some(remaining) = self.pledge_remaining_minutes(now, user_id) {
            effects.push(say(notice::pledge_already_active(user_id, remaining)));
            return effects;
        }

        self.pledge_target_minutes.insert(user_id, minutes);
        self.pledge_completed_seconds.insert(user_id, 0.0);
        effects.push(say(notice::pledge_accepted(user_id, minutes)));

        // Study done before the declaration does not count toward the pledge.
        let studying = self.ledger.get(user_id).is_some_and(|session| session.in_study);
        if studying && self.policy.rooms.classify(Some(voice)).is_counted() {
            self.pledge_entered_at.insert(user_id, now);
        }

        let pledge_room = self.policy.rooms.pledge_voice();
        if voice == pledge_room {
            // No voice update will follow a move into the same room.
            let quota_met = self.is_quota_complete(user_id);
            let session = self.ledger.session(user_id);
            session.accrue(now, quota_met);
            session.enter_study(pledge_room, now, quota_met);
            self.pledge_entered_at.insert(user_id, now);
            effects.push(Effect::Notice(notice::pledge_remaining(
                user_id,
                minutes as i64,
            )));
        } else {
            effects.push(Effect::Move {
                user_id,
                channel_id: pledge_room,
            });
        }

        effects
    }

    //
    // Chat
    //

    /// Count a message from a member and decide whether it may stay.
    pub fn gate_message(
        &mut self,
        user_id: UserId,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> ChatVerdict {
        let mut verdict = ChatVerdict::default();
        if self.is_quota_complete(user_id) {
            return verdict;
        }

        let count = self.message_count.entry(user_id).or_insert(0);
        *count += 1;
        if *count <= self.policy.chat_limit {
            return verdict;
        }

        verdict.blocked = true;
        verdict.effects.push(Effect::Delete {
            channel_id,
            message_id,
        });
        verdict.effects.push(Effect::Say {
            channel_id,
            content: notice::chat_scold(user_id),
        });
        if let Some(role_id) = self.policy.chat_restricted_role {
            if self.restricted_chat.insert(user_id) {
                verdict.effects.push(Effect::GrantRole { user_id, role_id });
            }
        }

        verdict
    }

    //
    // AI credits and queries
    //

    /// Today's accrued minutes, including the visit in progress.
    pub fn study_minutes(&mut self, now: DateTime<Utc>, user_id: UserId) -> i64 {
        let quota_met = self.is_quota_complete(user_id);
        let session = self.ledger.session(user_id);
        session.accrue(now, quota_met);
        session.total_minutes()
    }

    pub fn ai_credits(&mut self, now: DateTime<Utc>, user_id: UserId) -> AiCredits {
        let quota_met = self.is_quota_complete(user_id);
        let session = self.ledger.session(user_id);
        session.accrue(now, quota_met);

        let hours = session.total_hours();
        let used = self.ai_usage.get(&user_id).copied().unwrap_or(0);
        AiCredits {
            hours,
            used,
            remaining: (1 + hours - used).max(0),
        }
    }

    /// Spend one credit up front.  `None` when there is nothing to spend.
    pub fn reserve_ai_credit(&mut self, now: DateTime<Utc>, user_id: UserId) -> Option<AiCredits> {
        if self.ai_credits(now, user_id).remaining <= 0 {
            return None;
        }
        *self.ai_usage.entry(user_id).or_insert(0) += 1;
        Some(self.ai_credits(now, user_id))
    }

    /// Admin grant: hand out `count` extra credits for today.
    pub fn grant_ai_credits(&mut self, user_id: UserId, count: u32) {
        *self.ai_usage.entry(user_id).or_insert(0) -= count as i64;
    }
}

fn whole_minutes(seconds: f64) -> i64 {
    (seconds / 60.0).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rooms::tests::*;
    use chrono::{Duration, TimeZone};

    const ALICE: UserId = UserId::new(1001);
    const BOB: UserId = UserId::new(1002);
    const CHAT: ChannelId = ChannelId::new(40);
    const PLEDGE_TEXT: ChannelId = ChannelId::new(41);
    const ROLE: RoleId = RoleId::new(50);

    fn policy() -> Policy {
        Policy {
            rooms: table(),
            utc_offset_hours: 9,
            chat_limit: 5,
            chat_restricted_role: Some(ROLE),
            rest_warning_minutes: vec![5, 10],
            rest_force_move_minutes: 15,
        }
    }

    fn service() -> StudyService {
        let mut service = StudyService::new(policy());
        service.maybe_reset(t0());
        service
    }

    /// 10:00 KST
    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 1, 0, 0).unwrap()
    }

    fn at(minutes: i64, seconds: i64) -> DateTime<Utc> {
        t0() + Duration::minutes(minutes) + Duration::seconds(seconds)
    }

    fn voice(entries: &[(UserId, ChannelId)]) -> HashMap<UserId, ChannelId> {
        entries.iter().copied().collect()
    }

    fn has_move(effects: &[Effect], user_id: UserId, channel_id: ChannelId) -> bool {
        effects.contains(&Effect::Move {
            user_id,
            channel_id,
        })
    }

    fn mute_of(effects: &[Effect], user_id: UserId) -> Option<bool> {
        effects.iter().rev().find_map(|effect| match effect {
            Effect::Mute { user_id: u, mute } if *u == user_id => Some(*mute),
            _ => None,
        })
    }

    fn notices(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|effect| matches!(effect, Effect::Notice(_)))
            .count()
    }

    #[test]
    fn same_channel_updates_are_ignored() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(ROOM_60));
        let effects = service.voice_transition(at(5, 0), ALICE, Some(ROOM_60), Some(ROOM_60));
        assert!(effects.is_empty());
        assert_eq!(service.session(ALICE).unwrap().total_study_seconds, 0.0);
    }

    #[test]
    fn accrual_sums_study_intervals_only() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(ROOM_180));
        service.voice_transition(at(20, 0), ALICE, Some(ROOM_180), Some(REST));
        service.voice_transition(at(30, 0), ALICE, Some(REST), Some(ROOM_3H_PLUS));
        service.voice_transition(at(45, 30), ALICE, Some(ROOM_3H_PLUS), Some(LOUNGE));
        service.voice_transition(at(50, 0), ALICE, Some(LOUNGE), Some(ROOM_180));
        service.voice_transition(at(55, 0), ALICE, Some(ROOM_180), None);
        // Disconnected time never counts.
        service.voice_transition(at(90, 0), ALICE, None, Some(FREEDOM));

        let session = service.session(ALICE).unwrap();
        assert_eq!(session.total_study_seconds, (20 * 60 + 15 * 60 + 30 + 5 * 60) as f64);
        assert!(!session.in_study);
    }

    #[test]
    fn entering_study_mutes_and_leaving_reports_visit() {
        let mut service = service();
        let effects = service.voice_transition(t0(), ALICE, None, Some(ROOM_60));
        assert_eq!(mute_of(&effects, ALICE), Some(true));
        assert_eq!(notices(&effects), 1);
        assert!(service.session(ALICE).unwrap().in_study);

        let effects = service.voice_transition(at(25, 0), ALICE, Some(ROOM_60), Some(LOUNGE));
        assert_eq!(mute_of(&effects, ALICE), Some(false));
        let Some(Effect::Notice(departure)) = effects.first() else {
            panic!("expected departure notice, got {effects:?}");
        };
        assert!(departure.contains("25분"));
    }

    #[test]
    fn freedom_mutes_members_below_quota() {
        let mut service = service();
        let effects = service.voice_transition(t0(), ALICE, None, Some(FREEDOM));
        assert_eq!(mute_of(&effects, ALICE), Some(true));

        service.completed_quota.insert(BOB);
        let effects = service.voice_transition(t0(), BOB, None, Some(FREEDOM));
        assert_eq!(mute_of(&effects, BOB), Some(false));
    }

    #[test]
    fn quota_poll_releases_member_just_before_the_limit() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(ROOM_60));
        let in_room = voice(&[(ALICE, ROOM_60)]);

        let effects = service.quota_tick(at(58, 0), &in_room);
        assert!(!has_move(&effects, ALICE, FREEDOM));

        let effects = service.quota_tick(at(59, 50), &in_room);
        assert!(has_move(&effects, ALICE, FREEDOM));
        assert_eq!(mute_of(&effects, ALICE), Some(false));
        assert!(service.is_quota_complete(ALICE));
        assert!(!service.session(ALICE).unwrap().in_study);

        // The move shows up as a voice update and is greeted, not taunted.
        let effects = service.voice_transition(at(60, 0), ALICE, Some(ROOM_60), Some(FREEDOM));
        assert_eq!(mute_of(&effects, ALICE), Some(false));
        assert_eq!(notices(&effects), 1);

        // Second visit: only the re-entry counter moves.
        let total = service.session(ALICE).unwrap().total_study_seconds;
        service.voice_transition(at(70, 0), ALICE, Some(FREEDOM), Some(ROOM_180));
        service.quota_tick(at(80, 0), &voice(&[(ALICE, ROOM_180)]));
        let session = service.session(ALICE).unwrap();
        assert_eq!(session.total_study_seconds, total);
        assert_eq!(session.session_study_seconds, 600.0);
    }

    #[test]
    fn reentry_requires_a_full_room_again() {
        let mut service = service();
        service.completed_quota.insert(ALICE);
        service.voice_transition(t0(), ALICE, None, Some(ROOM_60));
        let in_room = voice(&[(ALICE, ROOM_60)]);

        assert!(!has_move(&service.quota_tick(at(30, 0), &in_room), ALICE, FREEDOM));
        assert!(has_move(&service.quota_tick(at(60, 0), &in_room), ALICE, FREEDOM));
    }

    #[test]
    fn quota_poll_skips_members_not_actually_in_the_room() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(ROOM_60));

        let effects = service.quota_tick(at(61, 0), &HashMap::new());
        assert!(effects.is_empty());
        assert_eq!(service.session(ALICE).unwrap().total_study_seconds, 0.0);
    }

    #[test]
    fn unlimited_mute_room_announces_but_does_not_move() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(ROOM_UNLIMITED_MUTE));
        let in_room = voice(&[(ALICE, ROOM_UNLIMITED_MUTE)]);

        let effects = service.quota_tick(at(300, 0), &in_room);
        assert!(service.is_quota_complete(ALICE));
        assert!(!has_move(&effects, ALICE, FREEDOM));
        assert!(service.session(ALICE).unwrap().in_study);

        let effects = service.quota_tick(at(330, 0), &in_room);
        assert!(effects.is_empty());
        assert_eq!(service.session(ALICE).unwrap().session_study_seconds, 1800.0);
    }

    #[test]
    fn long_room_releases_at_its_override() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(ROOM_3H_PLUS));
        let in_room = voice(&[(ALICE, ROOM_3H_PLUS)]);

        assert!(!has_move(&service.quota_tick(at(240, 0), &in_room), ALICE, FREEDOM));
        assert!(has_move(&service.quota_tick(at(300, 0), &in_room), ALICE, FREEDOM));
    }

    #[test]
    fn ai_credit_notice_fires_once_per_hour() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(ROOM_3H_PLUS));
        let in_room = voice(&[(ALICE, ROOM_3H_PLUS)]);

        assert_eq!(notices(&service.quota_tick(at(30, 0), &in_room)), 0);
        assert_eq!(notices(&service.quota_tick(at(60, 0), &in_room)), 1);
        assert_eq!(notices(&service.quota_tick(at(61, 0), &in_room)), 0);
        assert_eq!(notices(&service.quota_tick(at(120, 0), &in_room)), 1);
    }

    #[test]
    fn rest_escalation_fires_each_threshold_once() {
        let mut service = service();
        let effects = service.voice_transition(t0(), ALICE, None, Some(REST));
        assert_eq!(mute_of(&effects, ALICE), Some(false));
        let resting = voice(&[(ALICE, REST)]);

        let mut warnings = Vec::new();
        let mut moves = 0;
        for minute in 1..=20 {
            let effects = service.rest_tick(at(minute, 0), &resting);
            warnings.push(notices(&effects));
            moves += effects
                .iter()
                .filter(|effect| matches!(effect, Effect::Move { .. }))
                .count();
        }

        // Warnings at 5 and 10, the move notice at 15.
        assert_eq!(warnings.iter().sum::<usize>(), 3);
        assert_eq!(warnings[4], 1);
        assert_eq!(warnings[9], 1);
        assert_eq!(warnings[14], 1);
        assert_eq!(moves, 1);
        assert!(!service.rest_entered_at.contains_key(&ALICE));
        assert!(!service.rest_warned.contains_key(&ALICE));
        assert_eq!(service.rest_total_seconds[&ALICE], 900.0);
    }

    #[test]
    fn late_poll_skips_stale_warning() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(REST));
        let resting = voice(&[(ALICE, REST)]);

        assert_eq!(notices(&service.rest_tick(at(11, 0), &resting)), 1);
        assert_eq!(notices(&service.rest_tick(at(12, 0), &resting)), 0);
    }

    #[test]
    fn forced_rest_move_lands_in_overflow_room() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(REST));
        let effects = service.rest_tick(at(15, 0), &voice(&[(ALICE, REST)]));
        assert!(has_move(&effects, ALICE, ROOM_180));

        // Rest tracking is gone, so the resulting voice update reports no rest visit.
        let effects = service.voice_transition(at(15, 5), ALICE, Some(REST), Some(ROOM_180));
        assert_eq!(notices(&effects), 1);
        assert!(service.session(ALICE).unwrap().in_study);
    }

    #[test]
    fn new_rest_visit_starts_fresh_warnings() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(REST));
        let resting = voice(&[(ALICE, REST)]);
        assert_eq!(notices(&service.rest_tick(at(6, 0), &resting)), 1);

        service.voice_transition(at(7, 0), ALICE, Some(REST), Some(ROOM_60));
        service.voice_transition(at(20, 0), ALICE, Some(ROOM_60), Some(REST));
        assert_eq!(service.rest_visits[&ALICE], 2);
        assert_eq!(notices(&service.rest_tick(at(26, 0), &resting)), 1);
    }

    #[test]
    fn chat_gate_restricts_once() {
        let mut service = service();
        for n in 1..=5 {
            let verdict = service.gate_message(ALICE, CHAT, MessageId::new(n));
            assert!(!verdict.blocked);
            assert!(verdict.effects.is_empty());
        }

        let verdict = service.gate_message(ALICE, CHAT, MessageId::new(6));
        assert!(verdict.blocked);
        assert!(verdict.effects.contains(&Effect::Delete {
            channel_id: CHAT,
            message_id: MessageId::new(6),
        }));
        assert!(verdict.effects.contains(&Effect::GrantRole {
            user_id: ALICE,
            role_id: ROLE,
        }));

        let verdict = service.gate_message(ALICE, CHAT, MessageId::new(7));
        assert!(verdict.blocked);
        assert!(!verdict
            .effects
            .iter()
            .any(|effect| matches!(effect, Effect::GrantRole { .. })));
    }

    #[test]
    fn chat_gate_ignores_members_with_quota() {
        let mut service = service();
        service.completed_quota.insert(ALICE);
        for n in 1..=20 {
            assert!(!service.gate_message(ALICE, CHAT, MessageId::new(n)).blocked);
        }
    }

    #[test]
    fn completing_quota_lifts_chat_restriction() {
        let mut service = service();
        for n in 1..=6 {
            service.gate_message(ALICE, CHAT, MessageId::new(n));
        }
        service.voice_transition(t0(), ALICE, None, Some(ROOM_60));
        let effects = service.quota_tick(at(60, 0), &voice(&[(ALICE, ROOM_60)]));
        assert!(effects.contains(&Effect::RevokeRole {
            user_id: ALICE,
            role_id: ROLE,
        }));
        assert!(!service.restricted_chat.contains(&ALICE));
    }

    #[test]
    fn reset_is_idempotent_within_a_day() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(ROOM_60));
        service.voice_transition(at(10, 0), ALICE, Some(ROOM_60), None);

        assert!(service.maybe_reset(at(60, 0)).is_empty());
        assert!(service.maybe_reset(at(120, 0)).is_empty());
        assert_eq!(service.session(ALICE).unwrap().total_study_seconds, 600.0);
    }

    #[test]
    fn midnight_clears_everything_and_revokes_roles() {
        let mut service = service();
        for n in 1..=6 {
            service.gate_message(ALICE, CHAT, MessageId::new(n));
        }
        service.voice_transition(t0(), BOB, None, Some(REST));
        service.completed_quota.insert(BOB);
        service.declare_pledge(t0(), ALICE, PLEDGE_TEXT, 120, Some(LOUNGE));

        // 00:00 KST next day
        let midnight = Utc.with_ymd_and_hms(2026, 3, 1, 15, 0, 0).unwrap();
        let effects = service.maybe_reset(midnight);

        assert_eq!(
            effects,
            vec![Effect::RevokeRole {
                user_id: ALICE,
                role_id: ROLE,
            }]
        );
        assert!(service.session(ALICE).is_none());
        assert!(!service.is_quota_complete(BOB));
        assert!(service.message_count.is_empty());
        assert!(service.rest_entered_at.is_empty());
        assert!(service.pledge_target_minutes.is_empty());
        assert!(service.restricted_chat.is_empty());
        assert!(service.maybe_reset(midnight).is_empty());
    }

    #[test]
    fn pledge_room_rejects_members_without_a_pledge() {
        let mut service = service();
        let effects = service.voice_transition(t0(), ALICE, None, Some(PLEDGE));
        assert_eq!(mute_of(&effects, ALICE), Some(true));
        assert_eq!(notices(&effects), 1);
        assert!(!service.session(ALICE).unwrap().in_study);
    }

    #[test]
    fn pledge_needs_voice() {
        let mut service = service();
        let effects = service.declare_pledge(t0(), ALICE, PLEDGE_TEXT, 120, None);
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::Say { channel_id, .. } if channel_id == PLEDGE_TEXT));
        assert!(service.pledge_remaining_minutes(t0(), ALICE).is_none());
    }

    #[test]
    fn pledge_completes_across_visits() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(LOUNGE));

        let effects = service.declare_pledge(t0(), ALICE, PLEDGE_TEXT, 120, Some(LOUNGE));
        assert!(has_move(&effects, ALICE, PLEDGE));
        assert_eq!(service.pledge_target_minutes[&ALICE], 120);
        assert_eq!(service.pledge_completed_seconds[&ALICE], 0.0);

        service.voice_transition(at(0, 1), ALICE, Some(LOUNGE), Some(PLEDGE));
        service.voice_transition(at(70, 1), ALICE, Some(PLEDGE), Some(LOUNGE));
        assert_eq!(service.pledge_remaining_minutes(at(70, 1), ALICE), Some(50));

        let effects = service.voice_transition(at(80, 0), ALICE, Some(LOUNGE), Some(PLEDGE));
        assert_eq!(mute_of(&effects, ALICE), Some(true));
        assert!(service.session(ALICE).unwrap().in_study);

        let effects = service.voice_transition(at(130, 0), ALICE, Some(PLEDGE), Some(LOUNGE));
        assert!(service.pledge_remaining_minutes(at(130, 0), ALICE).is_none());
        assert!(!service.pledge_completed_seconds.contains_key(&ALICE));
        assert!(service.is_quota_complete(ALICE));
        // Departure plus fulfilment.
        assert_eq!(notices(&effects), 2);
        assert_eq!(service.session(ALICE).unwrap().total_study_seconds, 120.0 * 60.0);

        // Nothing about the pledge on the next study entry.
        let effects = service.voice_transition(at(140, 0), ALICE, Some(LOUNGE), Some(ROOM_60));
        let Some(Effect::Notice(content)) = effects.last() else {
            panic!("expected entry notice");
        };
        assert!(!content.contains("다짐"));
    }

    #[test]
    fn pledge_poll_releases_member() {
        let mut service = service();
        service.declare_pledge(t0(), ALICE, PLEDGE_TEXT, 30, Some(LOUNGE));
        service.voice_transition(t0(), ALICE, Some(LOUNGE), Some(PLEDGE));
        let in_room = voice(&[(ALICE, PLEDGE)]);

        assert!(!has_move(&service.quota_tick(at(20, 0), &in_room), ALICE, FREEDOM));
        let effects = service.quota_tick(at(30, 0), &in_room);
        assert!(has_move(&effects, ALICE, FREEDOM));
        assert!(service.pledge_remaining_minutes(at(30, 0), ALICE).is_none());
        assert!(service.is_quota_complete(ALICE));
    }

    #[test]
    fn pledge_declared_inside_pledge_room_starts_immediately() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(PLEDGE));
        let effects = service.declare_pledge(at(1, 0), ALICE, PLEDGE_TEXT, 60, Some(PLEDGE));
        assert!(!has_move(&effects, ALICE, PLEDGE));
        assert!(service.session(ALICE).unwrap().in_study);
        assert_eq!(service.pledge_remaining_minutes(at(31, 0), ALICE), Some(30));
    }

    #[test]
    fn second_pledge_is_refused_while_active() {
        let mut service = service();
        service.declare_pledge(t0(), ALICE, PLEDGE_TEXT, 60, Some(LOUNGE));
        let effects = service.declare_pledge(t0(), ALICE, PLEDGE_TEXT, 600, Some(LOUNGE));
        assert_eq!(effects.len(), 1);
        assert_eq!(service.pledge_target_minutes[&ALICE], 60);
    }

    #[test]
    fn pledge_takes_priority_over_room_notice() {
        let mut service = service();
        service.declare_pledge(t0(), ALICE, PLEDGE_TEXT, 60, Some(LOUNGE));
        let effects = service.voice_transition(t0(), ALICE, Some(LOUNGE), Some(ROOM_180));
        let Some(Effect::Notice(content)) = effects.last() else {
            panic!("expected entry notice");
        };
        assert!(content.contains("다짐"));

        // Time in a regular room still counts toward the pledge.
        service.voice_transition(at(45, 0), ALICE, Some(ROOM_180), Some(LOUNGE));
        assert_eq!(service.pledge_remaining_minutes(at(45, 0), ALICE), Some(15));
    }

    #[test]
    fn pledge_ignores_time_before_declaration() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(ROOM_180));

        let effects = service.declare_pledge(at(100, 0), ALICE, PLEDGE_TEXT, 120, Some(ROOM_180));
        assert!(has_move(&effects, ALICE, PLEDGE));
        assert_eq!(service.pledge_remaining_minutes(at(100, 0), ALICE), Some(120));

        service.voice_transition(at(100, 1), ALICE, Some(ROOM_180), Some(PLEDGE));
        assert_eq!(service.pledge_remaining_minutes(at(100, 1), ALICE), Some(119));
        assert!(service.pledge_completed_seconds[&ALICE] <= 1.0);
        // The room time itself is still on the day's total.
        assert_eq!(service.study_minutes(at(100, 1), ALICE), 100);
    }

    #[test]
    fn poll_release_keeps_pledge_progress() {
        let mut service = service();
        service.declare_pledge(t0(), ALICE, PLEDGE_TEXT, 120, Some(LOUNGE));
        service.voice_transition(t0(), ALICE, Some(LOUNGE), Some(ROOM_60));

        let effects = service.quota_tick(at(60, 0), &voice(&[(ALICE, ROOM_60)]));
        assert!(has_move(&effects, ALICE, FREEDOM));

        service.voice_transition(at(60, 5), ALICE, Some(ROOM_60), Some(FREEDOM));
        assert_eq!(service.pledge_remaining_minutes(at(60, 5), ALICE), Some(60));
    }

    #[test]
    fn poll_release_can_fulfil_the_pledge() {
        let mut service = service();
        service.declare_pledge(t0(), ALICE, PLEDGE_TEXT, 60, Some(LOUNGE));
        service.voice_transition(t0(), ALICE, Some(LOUNGE), Some(ROOM_60));

        let effects = service.quota_tick(at(60, 0), &voice(&[(ALICE, ROOM_60)]));
        assert!(has_move(&effects, ALICE, FREEDOM));
        assert!(service.pledge_remaining_minutes(at(60, 0), ALICE).is_none());
        assert!(service.is_quota_complete(ALICE));
    }

    #[test]
    fn ai_credits_follow_study_hours() {
        let mut service = service();
        assert_eq!(
            service.ai_credits(t0(), ALICE),
            AiCredits {
                hours: 0,
                used: 0,
                remaining: 1,
            }
        );

        assert!(service.reserve_ai_credit(t0(), ALICE).is_some());
        assert!(service.reserve_ai_credit(t0(), ALICE).is_none());

        service.voice_transition(t0(), ALICE, None, Some(ROOM_3H_PLUS));
        let credits = service.reserve_ai_credit(at(125, 0), ALICE).unwrap();
        assert_eq!(credits.hours, 2);
        assert_eq!(credits.remaining, 1);

        service.grant_ai_credits(ALICE, 3);
        assert_eq!(service.ai_credits(at(125, 0), ALICE).remaining, 4);
    }

    #[test]
    fn anchor_prevents_double_counting_between_query_and_transition() {
        let mut service = service();
        service.voice_transition(t0(), ALICE, None, Some(ROOM_180));

        assert_eq!(service.study_minutes(at(30, 0), ALICE), 30);
        service.voice_transition(at(30, 0), ALICE, Some(ROOM_180), None);
        assert_eq!(service.session(ALICE).unwrap().total_study_seconds, 1800.0);
    }
}
