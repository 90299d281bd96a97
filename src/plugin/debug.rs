use crate::{event::*, log_event, logging::*, plugin::*};
use anyhow::Result;

/// Logs every event
pub struct Debug;

#[serenity::async_trait]
impl Plugin for Debug {
    fn name(&self) -> &'static str {
        "debug"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        match event {
            Event::Ready { guilds } => {
                log_event!("Connected to {} server(s)", guilds.len());
            }
            Event::GuildJoin(guild_id) => {
                log_event!("Joined guild {}", Some(*guild_id).color());
            }
            Event::GuildLeave(guild_id) => {
                log_event!("Left guild {}", Some(*guild_id).color());
            }
            Event::Command(inv) => {
                log_event!(
                    "{}{}{}{}{}{} {} {}",
                    inv.guild_id.color(),
                    Glue.color(),
                    inv.channel_id.color(ctx.platform).await,
                    Glue.color(),
                    UserName(&inv.author_name).color(),
                    Glue.color(),
                    inv.command,
                    inv.args.join(" "),
                );
            }
        }

        Ok(EventHandled::No)
    }
}
