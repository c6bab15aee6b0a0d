pub use crate::context::Context;
use crate::event::{Event, EventHandled};
use anyhow::Result;

mod ai_channel;
mod ai_credits;
mod ai_grant;
mod ai_test;
mod chat_gate;
mod debug;
mod dedup;
mod help;
mod ignore_bots;
mod ping;
mod pledge;
mod presence;
mod ready;
mod study_time;

#[serenity::async_trait]
pub trait Plugin: Sync + Send {
    /// Plugin name.  For commands this is also the command word.
    fn name(&self) -> &'static str;
    /// Help message line.  None if no help message
    fn usage(&self, ctx: &Context) -> Option<String>;
    /// Potentially handle event.  Returns:
    /// - Ok(EventHandled::Yes) if the event has been handled and no other plugin should attempt to
    /// handle it
    /// - Ok(EventHandled::No) if another plugin should attempt to handle the event
    /// - Err if an error occurred
    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled>;
}

/// Ordered list of available plugins
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        // Core bot operations
        Box::new(debug::Debug),
        Box::new(ready::Ready),
        Box::new(ignore_bots::IgnoreBots),
        Box::new(dedup::Dedup),
        // Voice presence
        Box::new(presence::Presence),
        // Every counted message goes through the gate before anything answers it
        Box::new(chat_gate::ChatGate),
        // Commands
        Box::new(help::Help),
        Box::new(ping::Ping),
        Box::new(study_time::StudyTime),
        Box::new(ai_credits::AiCredits),
        Box::new(ai_grant::AiGrant),
        Box::new(ai_test::AiTest),
        // Free-form messages in dedicated channels.  Keep last.
        Box::new(pledge::Pledge),
        Box::new(ai_channel::AiChannel),
    ]
}
