use crate::{
    event::*,
    plugin::*,
    reply::Reply,
    validation::{ArgCount, RuleSet, ValidationRule},
};
use anyhow::Result;
use std::sync::LazyLock;

const CHANNEL: &str = "channel";
const VOICE_CHANNEL: &str = "voice_channel";

static CHANNEL_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new([
        ValidationRule::guild("This command only works in a server", CHANNEL),
        ValidationRule::channel_mention("Mention exactly one channel, like #general", CHANNEL),
    ])
});

static VOICE_CHANNEL_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new([
        ValidationRule::guild("This command only works in a server", VOICE_CHANNEL),
        ValidationRule::arg_count(
            ArgCount::Exact(1),
            "Give the name of the voice channel",
            VOICE_CHANNEL,
        ),
        ValidationRule::voice_channel_by_name(0, "Voice channel not found", VOICE_CHANNEL),
    ])
});

/// Per-guild channel settings
pub struct Settings;

#[serenity::async_trait]
impl Plugin for Settings {
    fn name(&self) -> &'static str {
        "settings"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = ctx.prefix().await;
        Some(format!(
            "`{prefix}{CHANNEL} #channel` - set the channel the bot talks in\n\
             `{prefix}{VOICE_CHANNEL} <name>` - set the voice channel the bot joins"
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        if let Some(inv) = event.is_bot_cmd(CHANNEL) {
            if !ctx.validator().evaluate(inv, &CHANNEL_RULES).await {
                return Ok(EventHandled::Yes);
            }
            let mentioned = ctx.validator().guild_mentions(inv).await;
            let (Some(guild_id), Some(channel)) = (inv.guild_id, mentioned.into_iter().next())
            else {
                return Ok(EventHandled::Yes);
            };

            let guild = ctx.guilds.ensure(guild_id).await?;
            let mut guild = guild.lock().await;
            guild.update_main_channel(ctx.platform, channel.id).await?;

            let name = match guild.main_channel_handle() {
                Some(handle) => handle.name.clone(),
                None => channel.name,
            };
            let reply = Reply::info(
                "Channel updated",
                format!("New text channel: {}", name),
                CHANNEL,
            );
            ctx.platform.send_message(inv.channel_id, &reply).await?;
            return Ok(EventHandled::Yes);
        }

        if let Some(inv) = event.is_bot_cmd(VOICE_CHANNEL) {
            if !ctx.validator().evaluate(inv, &VOICE_CHANNEL_RULES).await {
                return Ok(EventHandled::Yes);
            }
            let (Some(guild_id), Some(name)) = (inv.guild_id, inv.args.first()) else {
                return Ok(EventHandled::Yes);
            };

            let channels = ctx.platform.voice_channels(guild_id).await?;
            let Some(channel) = channels.into_iter().find(|channel| &channel.name == name) else {
                // Deleted since validation
                let reply = Reply::error("Voice channel not found", VOICE_CHANNEL);
                ctx.platform.send_message(inv.channel_id, &reply).await?;
                return Ok(EventHandled::Yes);
            };

            let guild = ctx.guilds.ensure(guild_id).await?;
            let mut guild = guild.lock().await;
            guild.update_voice_channel(ctx.platform, channel.id).await?;

            let name = match guild.voice_channel_handle() {
                Some(handle) => handle.name.clone(),
                None => channel.name,
            };
            let reply = Reply::info(
                "Voice channel updated",
                format!("New voice channel: {}", name),
                VOICE_CHANNEL,
            );
            ctx.platform.send_message(inv.channel_id, &reply).await?;
            return Ok(EventHandled::Yes);
        }

        Ok(EventHandled::No)
    }
}
