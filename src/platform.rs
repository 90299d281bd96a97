//! The chat platform as seen by the bot core.
//!
//! Validation, guild state and the voice controller only talk to Discord through [`Platform`], so
//! they can run against an in-memory stand-in.  The Serenity-backed implementation lives in
//! `crate::discord`.

use crate::{error::PlatformError, reply::Reply, voice::VoiceClient};
use serenity::all::{ChannelId, GuildId, UserId};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Voice,
    Other,
}

/// Snapshot of a channel, detached from the platform cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub name: String,
    pub kind: ChannelKind,
}

#[serenity::async_trait]
pub trait Platform: Send + Sync {
    /// The bot's own account
    fn current_user_id(&self) -> UserId;
    /// Resolve a channel.  `None` if it no longer exists or is not visible to the bot.
    async fn channel(&self, channel_id: ChannelId) -> Option<ChannelInfo>;
    /// Text channels of a guild, in display order
    async fn text_channels(&self, guild_id: GuildId) -> Result<Vec<ChannelInfo>, PlatformError>;
    /// Voice channels of a guild, in display order
    async fn voice_channels(&self, guild_id: GuildId) -> Result<Vec<ChannelInfo>, PlatformError>;
    /// Users currently connected to a voice channel
    async fn voice_members(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Vec<UserId>, PlatformError>;
    /// Move a user out of voice entirely
    async fn disconnect_member(&self, guild_id: GuildId, user_id: UserId)
        -> Result<(), PlatformError>;
    /// Establish a voice transport in a channel
    async fn connect_voice(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<dyn VoiceClient>, PlatformError>;
    async fn send_message(&self, channel_id: ChannelId, reply: &Reply) -> Result<(), PlatformError>;
    /// Stop receiving events and close the gateway connection
    async fn shutdown(&self);
}
