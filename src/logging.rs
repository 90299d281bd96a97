//! Logging to the terminal with colors

use crate::platform::{ChannelInfo, Platform};
use serenity::all::{ChannelId, GuildId};
use std::io::IsTerminal;
use std::sync::LazyLock;
use tracing_subscriber::EnvFilter;

const DEFAULT: &str = "\x1b[0m";
const FG_BLUE: &str = "\x1b[38;5;33m";
const FG_CYAN: &str = "\x1b[36m";
const FG_GRAY: &str = "\x1b[90m";
const FG_GREEN: &str = "\x1b[32m";
const FG_MAGENTA: &str = "\x1b[35m";
const FG_RED: &str = "\x1b[31m";
const FG_YELLOW: &str = "\x1b[33m";

// This won't change during the program's execution, so we can cache it.
static STDOUT_IS_TERMINAL: LazyLock<bool> = LazyLock::new(|| std::io::stdout().is_terminal());

/// Install the global `tracing` subscriber.  `RUST_LOG` overrides the default `info` level.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(*STDOUT_IS_TERMINAL)
        .with_target(false)
        .init();
}

pub enum Color {
    Default,
    Event,
    Internal,
    Warn,
    User,
    Channel,
    Guild,
    Glue,
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        // Only print colors when printing to a terminal
        if !*STDOUT_IS_TERMINAL {
            return Ok(());
        }

        write!(
            f,
            "{}",
            match self {
                Color::Default => DEFAULT,
                Color::Event => FG_YELLOW,
                Color::Internal => FG_MAGENTA,
                Color::Warn => FG_RED,
                Color::User => FG_GREEN,
                Color::Channel => FG_CYAN,
                Color::Guild => FG_BLUE,
                Color::Glue => FG_GRAY,
            }
        )
    }
}

/// Something that happened on Discord
#[macro_export]
macro_rules! log_event {
    ($fmtstr:expr $(, $args:expr)* $(,)?) => {{
        ::tracing::info!(
            target: "guildbot::event",
            "{}",
            format_args!(
                concat!("{}*{} ", $fmtstr),
                $crate::logging::Color::Event,
                $crate::logging::Color::Default
                $(, $args)*
            )
        )
    }};
}

/// Something the bot did on its own
#[macro_export]
macro_rules! log_internal {
    ($fmtstr:expr $(, $args:expr)* $(,)?) => {{
        ::tracing::info!(
            target: "guildbot::internal",
            "{}",
            format_args!(
                concat!("{}+{} ", $fmtstr),
                $crate::logging::Color::Internal,
                $crate::logging::Color::Default
                $(, $args)*
            )
        )
    }};
}

/// Something went wrong but the bot carries on
#[macro_export]
macro_rules! log_warn {
    ($fmtstr:expr $(, $args:expr)* $(,)?) => {{
        ::tracing::warn!(
            target: "guildbot::internal",
            "{}",
            format_args!(
                concat!("{}!{} ", $fmtstr),
                $crate::logging::Color::Warn,
                $crate::logging::Color::Default
                $(, $args)*
            )
        )
    }};
}

pub trait PrintColor {
    fn color(&self) -> String;
}

#[serenity::async_trait]
pub trait AsyncPrintColor {
    async fn color(&self, platform: &dyn Platform) -> String;
}

// Field separator
pub struct Glue;
impl PrintColor for Glue {
    fn color(&self) -> String {
        format!("{}{}{}", Color::Glue, ":", Color::Default)
    }
}

/// A user by display name
pub struct UserName<'a>(pub &'a str);
impl PrintColor for UserName<'_> {
    fn color(&self) -> String {
        format!("{}{}{}", Color::User, self.0, Color::Default)
    }
}

impl PrintColor for ChannelInfo {
    fn color(&self) -> String {
        format!("{}{}{}", Color::Channel, self.name, Color::Default)
    }
}

impl PrintColor for Option<GuildId> {
    fn color(&self) -> String {
        match self {
            Some(guild_id) => format!("{}{}{}", Color::Guild, guild_id, Color::Default),
            None => format!("{}<direct-message>{}", Color::Guild, Color::Default),
        }
    }
}

#[serenity::async_trait]
impl AsyncPrintColor for ChannelId {
    async fn color(&self, platform: &dyn Platform) -> String {
        match platform.channel(*self).await {
            Some(channel) => channel.color(),
            None => format!("{}<unknown-channel>{}", Color::Channel, Color::Default),
        }
    }
}
