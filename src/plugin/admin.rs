use crate::{
    event::*,
    log_internal, log_warn,
    plugin::*,
    reply::Reply,
    validation::{RuleSet, ValidationRule},
    voice::VoiceState,
};
use anyhow::Result;
use std::{sync::LazyLock, time::Duration};

const INFO: &str = "info";
const SAVE: &str = "save";
const OFF: &str = "off";
const RELOAD: &str = "reload";
const RESET: &str = "reset";

const NOT_ADMIN: &str = "You are not allowed to use this command";

static SAVE_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new([
        ValidationRule::admin(NOT_ADMIN, SAVE),
        ValidationRule::guild("This command only works in a server", SAVE),
    ])
});

static OFF_RULES: LazyLock<RuleSet> =
    LazyLock::new(|| RuleSet::new([ValidationRule::admin(NOT_ADMIN, OFF)]));

static RESET_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new([
        ValidationRule::admin(NOT_ADMIN, RESET),
        ValidationRule::guild("This command only works in a server", RESET),
    ])
});

static RELOAD_RULES: LazyLock<RuleSet> =
    LazyLock::new(|| RuleSet::new([ValidationRule::admin(NOT_ADMIN, RELOAD)]));

/// Bot status and lifecycle
pub struct Admin;

#[serenity::async_trait]
impl Plugin for Admin {
    fn name(&self) -> &'static str {
        "admin"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = ctx.prefix().await;
        Some(format!(
            "`{prefix}{INFO}` - show bot information\n\
             `{prefix}{SAVE}` - save this server's settings (bot admins only)\n\
             `{prefix}{OFF}` - shut the bot down (bot admins only)\n\
             `{prefix}{RESET}` - forget everything stored about this server (bot admins only)\n\
             `{prefix}{RELOAD}` - reload the configuration file (bot admins only)"
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        if let Some(inv) = event.is_bot_cmd(INFO) {
            let voice = match (ctx.voice.state(), ctx.voice.channel()) {
                (VoiceState::Connected, Some(channel)) => format!("connected to {}", channel.name),
                (state, _) => format!("{:?}", state).to_lowercase(),
            };

            let body = format!(
                "**{} {}**\n\
                 Servers loaded: {}\n\
                 Voice: {}\n\
                 Uptime: {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                ctx.guilds.len().await,
                voice,
                format_uptime(ctx.started.elapsed()),
            );
            let mut reply = Reply::info("Information", body, INFO);
            if let Some(website) = &ctx.cfg.read().await.general.website {
                reply = reply.with_url(website);
            }
            ctx.platform.send_message(inv.channel_id, &reply).await?;
            return Ok(EventHandled::Yes);
        }

        if let Some(inv) = event.is_bot_cmd(SAVE) {
            if !ctx.validator().evaluate(inv, &SAVE_RULES).await {
                return Ok(EventHandled::Yes);
            }
            let Some(guild_id) = inv.guild_id else {
                return Ok(EventHandled::Yes);
            };

            ctx.guilds.ensure(guild_id).await?;
            ctx.guilds.save(guild_id).await?;
            log_internal!("Saved guild {} on request of {}", guild_id, inv.author_name);

            let reply = Reply::info("Saved", "Saved data is kept separately for each server", SAVE);
            ctx.platform.send_message(inv.channel_id, &reply).await?;
            return Ok(EventHandled::Yes);
        }

        if let Some(inv) = event.is_bot_cmd(OFF) {
            if !ctx.validator().evaluate(inv, &OFF_RULES).await {
                return Ok(EventHandled::Yes);
            }

            let goodbye = ctx.cfg.read().await.general.goodbye_message.clone();
            let reply = Reply::info("Shutting down", goodbye, OFF);
            ctx.platform.send_message(inv.channel_id, &reply).await?;

            log_internal!("Saving every guild... ");
            let saved = ctx.guilds.save_all().await;
            log_internal!("Saving every guild... {} saved", saved);

            if let Err(e) = ctx.voice.disconnect().await {
                log_warn!("Could not leave voice channel: {}", e);
            }

            log_internal!("Shutting down on request of {}", inv.author_name);
            ctx.platform.shutdown().await;
            return Ok(EventHandled::Yes);
        }

        if let Some(inv) = event.is_bot_cmd(RESET) {
            if !ctx.validator().evaluate(inv, &RESET_RULES).await {
                return Ok(EventHandled::Yes);
            }
            let Some(guild_id) = inv.guild_id else {
                return Ok(EventHandled::Yes);
            };

            ctx.guilds.reset(guild_id).await?;
            log_internal!("Reset guild {} on request of {}", guild_id, inv.author_name);

            let reply = Reply::info("Reset", "Settings of this server are back to defaults", RESET);
            ctx.platform.send_message(inv.channel_id, &reply).await?;
            return Ok(EventHandled::Yes);
        }

        if let Some(inv) = event.is_bot_cmd(RELOAD) {
            if !ctx.validator().evaluate(inv, &RELOAD_RULES).await {
                return Ok(EventHandled::Yes);
            }

            // Admins and storage are set up once at startup and keep their values
            ctx.cfg.write().await.reload().await?;
            log_internal!("Configuration reloaded on request of {}", inv.author_name);

            let reply = Reply::info("Reloaded", "Configuration reloaded successfully", RELOAD);
            ctx.platform.send_message(inv.channel_id, &reply).await?;
            return Ok(EventHandled::Yes);
        }

        Ok(EventHandled::No)
    }
}

fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (days, hours, minutes, secs) = (secs / 86400, secs / 3600 % 24, secs / 60 % 60, secs % 60);
    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::format_uptime;
    use crate::{
        event::Event,
        testing::{TestBot, ADMIN_ID, MEMBER_ID},
        voice::VoiceState,
    };
    use serenity::all::GuildId;
    use std::time::Duration;

    #[test]
    fn uptime() {
        assert_eq!(format_uptime(Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_uptime(Duration::from_secs(3 * 3600 + 61)), "03:01:01");
        assert_eq!(format_uptime(Duration::from_secs(86400 + 5)), "1d 00:00:05");
    }

    #[tokio::test]
    async fn info_is_open_to_everyone() {
        let bot = TestBot::new();
        bot.dispatch(Event::Ready {
            guilds: vec![TestBot::guild(), GuildId::new(7)],
        })
        .await;

        let replies = bot.dm_command(MEMBER_ID, ";info").await;

        assert_eq!(replies.len(), 1);
        assert!(replies[0].body.contains("Servers loaded: 2"));
        assert!(replies[0].body.contains("Voice: idle"));
    }

    #[tokio::test]
    async fn info_links_the_configured_website() {
        let bot = TestBot::new();
        assert_eq!(bot.command(MEMBER_ID, ";info").await[0].url, None);

        bot.cfg.write().await.general.website = Some("https://example.org/guildbot".into());
        let replies = bot.command(MEMBER_ID, ";info").await;

        assert_eq!(replies[0].url.as_deref(), Some("https://example.org/guildbot"));
    }

    #[tokio::test]
    async fn save_writes_the_guild_record() {
        let bot = TestBot::new();
        bot.dispatch(Event::Ready {
            guilds: vec![TestBot::guild()],
        })
        .await;
        let data_file = bot
            .cfg
            .read()
            .await
            .storage
            .guilds_dir
            .join("42_data.json");
        assert!(!data_file.exists());

        let replies = bot.command(MEMBER_ID, ";save").await;
        assert!(replies[0].is_error);
        assert!(!data_file.exists());

        let replies = bot.command(ADMIN_ID, ";save").await;
        assert!(!replies[0].is_error);
        assert!(data_file.exists());
    }

    #[tokio::test]
    async fn off_saves_leaves_voice_and_shuts_down() {
        let bot = TestBot::new();
        bot.platform.add_voice_channel(TestBot::guild(), 200, "Lounge");
        bot.command(MEMBER_ID, ";join").await;

        let replies = bot.command(MEMBER_ID, ";off").await;
        assert!(replies[0].is_error);
        assert_eq!(bot.platform.shutdowns(), 0);

        let replies = bot.command(ADMIN_ID, ";off").await;
        assert_eq!(replies[0].title, "Shutting down");
        assert_eq!(replies[0].body, "Bye");
        assert_eq!(bot.voice.state(), VoiceState::Idle);
        assert_eq!(bot.platform.shutdowns(), 1);
        assert!(bot
            .cfg
            .read()
            .await
            .storage
            .guilds_dir
            .join("42_data.json")
            .exists());
    }

    #[tokio::test]
    async fn reset_restores_defaults() {
        let bot = TestBot::new();
        bot.platform.add_text_channel(TestBot::guild(), 100, "bots");
        bot.command(MEMBER_ID, ";channel <#100>").await;

        let replies = bot.command(ADMIN_ID, ";reset").await;
        assert!(!replies[0].is_error);

        let guild = bot.guilds.get(TestBot::guild()).await.unwrap();
        assert_eq!(guild.lock().await.settings().main_channel_id, 0);
        let stored = tokio::fs::read_to_string(
            bot.cfg
                .read()
                .await
                .storage
                .guilds_dir
                .join("42_settings.json"),
        )
        .await
        .unwrap();
        assert!(stored.contains("\"Main channel ID\": 0"));
    }

    #[tokio::test]
    async fn reload_is_admin_only() {
        let bot = TestBot::new();

        let replies = bot.command(MEMBER_ID, ";reload").await;

        assert_eq!(replies[0].body, "You are not allowed to use this command");
        assert_eq!(replies[0].footer, "reload");
    }
}
