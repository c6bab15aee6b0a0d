mod clock;
mod config;
mod context;
mod dedup;
mod discord;
mod duration;
mod effect;
mod event;
mod gemini;
mod handler;
mod health;
mod helper;
mod ledger;
mod logging;
mod notice;
mod plugin;
mod reconciler;
mod rooms;
mod study;

use serenity::{all::GatewayIntents, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = crate::config::Config::load().await?;
    let token = cfg.secrets.discord_token.clone();
    let dedup_dir = cfg
        .general
        .dedup_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("studybot-dedup"));
    let dedup = crate::dedup::Dedup::with_markers(dedup_dir).await?;
    let handler = handler::Handler::new(cfg, dedup);

    // Things we want discord to tell us about.
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(&token, intents)
        .event_handler(handler)
        .await?
        .start()
        .await
        .map_err(Into::into)
}
