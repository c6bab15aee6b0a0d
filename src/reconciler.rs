//! Periodic polls that run independently of incoming events
//!
//! Each poll takes a snapshot of who is actually connected where, runs the matching
//! [`StudyService`] tick under the lock, releases the lock and only then performs the
//! resulting effects.

use crate::{
    config::Config, discord::DiscordPlatform, effect, helper::CacheHelper, log_internal,
    study::StudyService,
};
use chrono::Utc;
use serenity::all::{Cache, Http};
use std::{sync::Arc, time::Duration};
use tokio::{sync::RwLock, time::MissedTickBehavior};

#[derive(Clone, Copy, Debug)]
enum Poll {
    /// Release members who reached their quota.
    Quota,
    /// Warn and then relocate members lingering in the rest room.
    Rest,
}

pub struct Reconciler {
    cfg: Arc<Config>,
    study: Arc<RwLock<StudyService>>,
    cache: Arc<Cache>,
    http: Arc<Http>,
}

impl Reconciler {
    pub fn new(
        cfg: Arc<Config>,
        study: Arc<RwLock<StudyService>>,
        cache: Arc<Cache>,
        http: Arc<Http>,
    ) -> Self {
        Self {
            cfg,
            study,
            cache,
            http,
        }
    }

    /// Start both polls on the runtime.  They run until the process exits.
    pub fn spawn(self) {
        let this = Arc::new(self);
        let quota_every = Duration::from_secs(this.cfg.timing.quota_poll_seconds);
        let rest_every = Duration::from_secs(this.cfg.timing.rest_poll_seconds);

        tokio::spawn(Arc::clone(&this).run(Poll::Quota, quota_every));
        tokio::spawn(this.run(Poll::Rest, rest_every));
    }

    async fn run(self: Arc<Self>, poll: Poll, every: Duration) {
        log_internal!("{:?} poll every {}s", poll, every.as_secs());

        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.tick(poll).await;
        }
    }

    async fn tick(&self, poll: Poll) {
        let guild_id = self.cfg.guild_id();
        let voice = self.cache.voice_snapshot(guild_id);

        let effects = {
            let mut study = self.study.write().await;
            match poll {
                Poll::Quota => study.quota_tick(Utc::now(), &voice),
                Poll::Rest => study.rest_tick(Utc::now(), &voice),
            }
        };

        if effects.is_empty() {
            return;
        }
        let platform =
            DiscordPlatform::new(Arc::clone(&self.http), guild_id, self.cfg.notice_channel());
        effect::apply(&platform, effects).await;
    }
}
