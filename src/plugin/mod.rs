pub use crate::context::Context;
use crate::event::{Event, EventHandled};
use anyhow::Result;

mod admin;
mod debug;
mod guilds;
mod help;
mod settings;
mod voice;

#[serenity::async_trait]
pub trait Plugin: Sync + Send {
    /// Plugin name.  Used for debug
    fn name(&self) -> &'static str;
    /// Help message lines.  None if no help message
    async fn usage(&self, ctx: &Context) -> Option<String>;
    /// Potentially handle event.  Returns:
    /// - Ok(EventHandled::Yes) if the event has been handled and no other plugin should attempt to
    ///   handle it
    /// - Ok(EventHandled::No) if another plugin should attempt to handle the event
    /// - Err if an error occurred
    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled>;
}

/// Ordered list of available plugins
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        // Core bot operations
        Box::new(debug::Debug),
        Box::new(guilds::Guilds),
        Box::new(help::Help),
        // Commands
        Box::new(settings::Settings),
        Box::new(voice::Voice),
        Box::new(admin::Admin),
    ]
}
