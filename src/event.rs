//! The Serenity crate we're using for the Discord API is designed around callbacks to handle
//! events.  However, this does not mesh well with our plugin framework here.  To resolve this,
//! `crate::handler` translates the callbacks to a distinct Event enum.

use crate::{context::Context, log_warn, reply::Reply, validation::Invocation};
use serenity::all::GuildId;

/// A Discord event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Connected, with the guilds the bot is a member of
    Ready { guilds: Vec<GuildId> },
    /// The bot was added to a guild
    GuildJoin(GuildId),
    /// The bot was removed from a guild
    GuildLeave(GuildId),
    /// A message addressed to the bot with its command prefix
    Command(Invocation),
}

impl Event {
    // When an event occurs, iterate over all the plugins to see if any can/should handle it.
    pub async fn handle(self, ctx: Context<'_>) {
        for plugin in crate::plugin::plugins() {
            match plugin.handle(&ctx, &self).await {
                Ok(EventHandled::Yes) => return,
                Ok(EventHandled::No) => continue,
                Err(err) => {
                    log_warn!("Error in plugin {}: {:#}", plugin.name(), err);
                    if let Event::Command(inv) = &self {
                        let reply = Reply::error("Command failed", inv.command.as_str());
                        if let Err(e) = ctx.platform.send_message(inv.channel_id, &reply).await {
                            log_warn!("Could not report failure of `{}`: {}", inv.command, e);
                        }
                    }
                    return;
                }
            }
        }
    }

    /// The invocation, if this event is the bot command `cmd`
    pub fn is_bot_cmd(&self, cmd: &str) -> Option<&Invocation> {
        match self {
            Event::Command(inv) if inv.is(cmd) => Some(inv),
            _ => None,
        }
    }
}

pub enum EventHandled {
    Yes,
    No,
}
