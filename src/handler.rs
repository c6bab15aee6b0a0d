use crate::{
    config::Config, context::Context, dedup::Dedup, event::Event, gemini::GeminiClient,
    study::StudyService,
};
use serenity::all::{Message, Ready, VoiceState};
use std::sync::{atomic::AtomicBool, Arc};
use tokio::sync::{Mutex, RwLock};

/// Discord event handler
pub struct Handler {
    cfg: Arc<Config>,
    study: Arc<RwLock<StudyService>>,
    dedup: Mutex<Dedup>,
    gemini: GeminiClient,
    started: AtomicBool,
}

impl<'a> Handler {
    pub fn new(cfg: Config, dedup: Dedup) -> Self {
        let study = StudyService::new(cfg.policy());
        let gemini = GeminiClient::new(cfg.secrets.gemini_api_key.clone(), cfg.gemini_settings());

        Self {
            cfg: Arc::new(cfg),
            study: Arc::new(RwLock::new(study)),
            dedup: Mutex::new(dedup),
            gemini,
            started: AtomicBool::new(false),
        }
    }

    fn ctx(&'a self, discord_ctx: &'a serenity::all::Context) -> Context<'a> {
        Context {
            cfg: &self.cfg,
            study: &self.study,
            dedup: &self.dedup,
            gemini: &self.gemini,
            started: &self.started,
            cache: &discord_ctx.cache,
            http: &discord_ctx.http,
            cache_http: discord_ctx,
        }
    }
}

#[serenity::async_trait]
impl serenity::all::EventHandler for Handler {
    async fn ready(&self, discord_ctx: serenity::all::Context, ready: Ready) {
        Event::Ready(ready).handle(self.ctx(&discord_ctx)).await;
    }

    async fn message(&self, discord_ctx: serenity::all::Context, msg: Message) {
        Event::Message(msg).handle(self.ctx(&discord_ctx)).await;
    }

    async fn voice_state_update(
        &self,
        discord_ctx: serenity::all::Context,
        old: Option<VoiceState>,
        new: VoiceState,
    ) {
        Event::VoiceStateUpdate { old, new }
            .handle(self.ctx(&discord_ctx))
            .await;
    }
}
