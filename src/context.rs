use crate::{
    config::Config, dedup::Dedup, discord::DiscordPlatform, gemini::GeminiClient,
    study::StudyService,
};
use std::sync::{atomic::AtomicBool, Arc};
use tokio::sync::{Mutex, RwLock};

/// Collection of data that is shared across events
pub struct Context<'a> {
    // The bot's own context types
    pub cfg: &'a Arc<Config>,
    pub study: &'a Arc<RwLock<StudyService>>,
    pub dedup: &'a Mutex<Dedup>,
    pub gemini: &'a GeminiClient,
    /// Set once the background tasks have been spawned.
    pub started: &'a AtomicBool,
    // Discord/Serenity context types
    pub cache: &'a Arc<serenity::all::Cache>,
    pub http: &'a Arc<serenity::all::Http>,
    pub cache_http: &'a CacheHttp,
}

impl Context<'_> {
    /// Where [`crate::effect::Effect`]s produced while handling an event are carried out.
    pub fn platform(&self) -> DiscordPlatform {
        DiscordPlatform::new(
            Arc::clone(self.http),
            self.cfg.guild_id(),
            self.cfg.notice_channel(),
        )
    }
}

/// Many Serenity functions take a `impl CacheHttp` in order to first check the cache if the item
/// is available and fall back to an http request otherwise.  The most readily available type that
/// impl's this is named very differently in a way that could be confusing, and so we alias it.
pub type CacheHttp = serenity::all::Context;
