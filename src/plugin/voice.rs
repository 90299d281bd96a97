use crate::{
    event::*,
    plugin::*,
    reply::Reply,
    validation::{ArgCount, ArgumentFormat, Invocation, RuleSet, ValidationRule},
    voice::VoiceState,
};
use anyhow::Result;
use serenity::all::GuildId;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::LazyLock,
};

const JOIN: &str = "join";
const LEAVE: &str = "leave";
const PLAY: &str = "play";
const CLEAR: &str = "clear";

const GUILD_ONLY: &str = "This command only works in a server";

static JOIN_RULES: LazyLock<RuleSet> =
    LazyLock::new(|| RuleSet::new([ValidationRule::guild(GUILD_ONLY, JOIN)]));

static LEAVE_RULES: LazyLock<RuleSet> =
    LazyLock::new(|| RuleSet::new([ValidationRule::guild(GUILD_ONLY, LEAVE)]));

static PLAY_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new([
        ValidationRule::guild(GUILD_ONLY, PLAY),
        ValidationRule::arg_count(ArgCount::Exact(1), "Name one audio clip", PLAY),
        ValidationRule::arg_format(
            vec![ArgumentFormat::string().with_length(1, 64)],
            true,
            "Clip names are 1 to 64 characters long",
            PLAY,
        ),
    ])
});

static CLEAR_RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new([
        ValidationRule::admin("You are not allowed to use this command", CLEAR),
        ValidationRule::guild(GUILD_ONLY, CLEAR),
    ])
});

/// Voice channel presence and audio clips
pub struct Voice;

#[serenity::async_trait]
impl Plugin for Voice {
    fn name(&self) -> &'static str {
        "voice"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let prefix = ctx.prefix().await;
        Some(format!(
            "`{prefix}{JOIN}` - join the configured voice channel\n\
             `{prefix}{LEAVE}` - leave the voice channel\n\
             `{prefix}{PLAY} <clip>` - play an audio clip\n\
             `{prefix}{CLEAR}` - disconnect everyone from the voice channel (bot admins only)"
        ))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::Command(inv) = event else {
            return Ok(EventHandled::No);
        };

        let rules: &RuleSet = match inv.command.as_str() {
            JOIN => &JOIN_RULES,
            LEAVE => &LEAVE_RULES,
            PLAY => &PLAY_RULES,
            CLEAR => &CLEAR_RULES,
            _ => return Ok(EventHandled::No),
        };

        if !ctx.validator().evaluate(inv, rules).await {
            return Ok(EventHandled::Yes);
        }
        let Some(guild_id) = inv.guild_id else {
            return Ok(EventHandled::Yes);
        };

        let reply = match inv.command.as_str() {
            JOIN => join(ctx, inv, guild_id).await?,
            LEAVE => leave(ctx, guild_id).await?,
            PLAY => play(ctx, inv, guild_id).await?,
            _ => clear(ctx, guild_id).await?,
        };

        ctx.platform.send_message(inv.channel_id, &reply).await?;
        Ok(EventHandled::Yes)
    }
}

/// The session belongs to another guild
fn busy_elsewhere(ctx: &Context, guild_id: GuildId, footer: &str) -> Option<Reply> {
    let channel = ctx.voice.channel()?;
    (channel.guild_id != Some(guild_id))
        .then(|| Reply::error("Already in a voice channel of another server", footer))
}

async fn join(ctx: &Context<'_>, inv: &Invocation, guild_id: GuildId) -> Result<Reply> {
    if let Some(reply) = busy_elsewhere(ctx, guild_id, JOIN) {
        return Ok(reply);
    }

    let guild = ctx.guilds.ensure(guild_id).await?;
    let Some(channel) = guild.lock().await.voice_channel(ctx.platform).await else {
        return Ok(Reply::error(
            format!(
                "This server has no voice channel, set one with `{}voice_channel`",
                ctx.prefix().await
            ),
            JOIN,
        ));
    };

    ctx.voice.connect(ctx.platform, &channel).await?;

    // Connecting is a no-op if a session already exists
    let active = ctx.voice.channel().unwrap_or(channel);
    Ok(Reply::info(
        "Voice",
        format!("{} joined {}", inv.author_name, active.name),
        JOIN,
    ))
}

async fn leave(ctx: &Context<'_>, guild_id: GuildId) -> Result<Reply> {
    if let Some(reply) = busy_elsewhere(ctx, guild_id, LEAVE) {
        return Ok(reply);
    }

    let Some(channel) = ctx.voice.channel() else {
        return Ok(Reply::error("Not in a voice channel", LEAVE));
    };

    ctx.voice.disconnect().await?;
    Ok(Reply::info("Voice", format!("Left {}", channel.name), LEAVE))
}

async fn play(ctx: &Context<'_>, inv: &Invocation, guild_id: GuildId) -> Result<Reply> {
    if let Some(reply) = busy_elsewhere(ctx, guild_id, PLAY) {
        return Ok(reply);
    }
    if ctx.voice.state() != VoiceState::Connected {
        return Ok(Reply::error(
            format!("Not in a voice channel, use `{}{}` first", ctx.prefix().await, JOIN),
            PLAY,
        ));
    }

    let Some(clip) = inv.args.first() else {
        return Ok(Reply::error("Name one audio clip", PLAY));
    };
    let audio_dir = ctx.cfg.read().await.voice.audio_dir.clone();
    let Some(path) = find_clip(&audio_dir, clip).await? else {
        return Ok(Reply::error(format!("No audio clip named \"{}\"", clip), PLAY));
    };

    ctx.voice.play_audio(&path).await?;
    Ok(Reply::info("Voice", format!("Playing {}", clip), PLAY))
}

async fn clear(ctx: &Context<'_>, guild_id: GuildId) -> Result<Reply> {
    if let Some(reply) = busy_elsewhere(ctx, guild_id, CLEAR) {
        return Ok(reply);
    }
    if ctx.voice.channel().is_none() {
        return Ok(Reply::error("Not in a voice channel", CLEAR));
    }

    let removed = ctx.voice.remove_all_members(ctx.platform).await?;
    Ok(Reply::info(
        "Voice",
        format!("Disconnected {} member(s)", removed),
        CLEAR,
    ))
}

/// A file directly inside `dir` named `clip`, with or without extension.
///
/// Only directory entries are compared, so a clip name can never point outside `dir`.
async fn find_clip(dir: &Path, clip: &str) -> Result<Option<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut candidates = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches = path.file_name().is_some_and(|name| name == clip)
            || path.file_stem().is_some_and(|stem| stem == clip);
        if matches && entry.file_type().await?.is_file() {
            candidates.push(path);
        }
    }

    // Stable pick when several extensions share a stem
    candidates.sort();
    Ok(candidates.into_iter().next())
}
