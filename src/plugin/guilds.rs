use crate::{event::*, log_internal, log_warn, plugin::*};
use anyhow::Result;

/// Keeps the guild registry in step with the guilds the bot is a member of
pub struct Guilds;

#[serenity::async_trait]
impl Plugin for Guilds {
    fn name(&self) -> &'static str {
        "guilds"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        match event {
            Event::Ready { guilds } => {
                log_internal!("Loading {} guild(s)... ", guilds.len());
                let loaded = ctx.guilds.load_all(guilds.iter().copied()).await;
                log_internal!("Loading {} guild(s)... {} loaded", guilds.len(), loaded);
                Ok(EventHandled::Yes)
            }
            Event::GuildJoin(guild_id) => {
                // A guild with an unreadable record is left unloaded rather than overwritten
                if let Err(e) = ctx.guilds.ensure(*guild_id).await {
                    log_warn!("Could not load joined guild {}: {}", guild_id, e);
                }
                Ok(EventHandled::Yes)
            }
            Event::GuildLeave(guild_id) => {
                if ctx.guilds.remove(*guild_id).await {
                    log_internal!("Unloaded guild {}", guild_id);
                }
                Ok(EventHandled::Yes)
            }
            Event::Command(_) => Ok(EventHandled::No),
        }
    }
}
