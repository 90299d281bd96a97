//! Serenity and Songbird implementations of the platform traits

use crate::{
    error::{PlatformError, VoiceError},
    platform::{ChannelInfo, ChannelKind, Platform},
    reply::Reply,
    voice::VoiceClient,
};
use serenity::all::{ChannelId, ChannelType, GuildChannel, GuildId, UserId};
use songbird::{
    input::File,
    tracks::{PlayMode, TrackHandle},
    Call, Songbird,
};
use std::{path::Path, sync::Arc};
use tokio::sync::Mutex;

/// [`Platform`] over the Serenity context of the event currently being handled.
pub struct SerenityPlatform<'a> {
    ctx: &'a serenity::all::Context,
}

impl<'a> SerenityPlatform<'a> {
    pub fn new(ctx: &'a serenity::all::Context) -> Self {
        Self { ctx }
    }

    /// Channels of a guild that [`channel_kind`] puts in `kind`
    async fn guild_channels(
        &self,
        guild_id: GuildId,
        kind: ChannelKind,
    ) -> Result<Vec<ChannelInfo>, PlatformError> {
        let mut channels: Vec<GuildChannel> = guild_id
            .channels(self.ctx)
            .await?
            .into_values()
            .filter(|channel| channel_kind(channel.kind) == kind)
            .collect();
        channels.sort_by_key(|channel| (channel.position, channel.id));

        Ok(channels.iter().map(ChannelInfo::from).collect())
    }
}

/// Announcement channels count as text, stage channels as voice
fn channel_kind(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::Text | ChannelType::News => ChannelKind::Text,
        ChannelType::Voice | ChannelType::Stage => ChannelKind::Voice,
        _ => ChannelKind::Other,
    }
}

impl From<&GuildChannel> for ChannelInfo {
    fn from(channel: &GuildChannel) -> Self {
        Self {
            id: channel.id,
            guild_id: Some(channel.guild_id),
            name: channel.name.clone(),
            kind: channel_kind(channel.kind),
        }
    }
}

#[serenity::async_trait]
impl Platform for SerenityPlatform<'_> {
    fn current_user_id(&self) -> UserId {
        self.ctx.cache.current_user().id
    }

    async fn channel(&self, channel_id: ChannelId) -> Option<ChannelInfo> {
        let channel = channel_id.to_channel(self.ctx).await.ok()?;
        match channel.guild() {
            Some(guild_channel) => Some(ChannelInfo::from(&guild_channel)),
            // Direct message channels have no guild and no name
            None => Some(ChannelInfo {
                id: channel_id,
                guild_id: None,
                name: String::new(),
                kind: ChannelKind::Other,
            }),
        }
    }

    async fn text_channels(&self, guild_id: GuildId) -> Result<Vec<ChannelInfo>, PlatformError> {
        self.guild_channels(guild_id, ChannelKind::Text).await
    }

    async fn voice_channels(&self, guild_id: GuildId) -> Result<Vec<ChannelInfo>, PlatformError> {
        self.guild_channels(guild_id, ChannelKind::Voice).await
    }

    async fn voice_members(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Vec<UserId>, PlatformError> {
        // Voice states only arrive over the gateway, so the cache is the sole source.
        let guild = self
            .ctx
            .cache
            .guild(guild_id)
            .ok_or_else(|| PlatformError::Other(format!("guild {} is not cached", guild_id)))?;

        Ok(guild
            .voice_states
            .values()
            .filter(|state| state.channel_id == Some(channel_id))
            .map(|state| state.user_id)
            .collect())
    }

    async fn disconnect_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<(), PlatformError> {
        guild_id.disconnect_member(self.ctx, user_id).await?;
        Ok(())
    }

    async fn connect_voice(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<dyn VoiceClient>, PlatformError> {
        let manager = songbird::get(self.ctx)
            .await
            .ok_or(PlatformError::VoiceUnavailable)?;
        let call = manager.join(guild_id, channel_id).await?;

        Ok(Arc::new(SongbirdClient {
            manager,
            guild_id,
            call,
            track: parking_lot::Mutex::new(None),
        }))
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        reply: &Reply,
    ) -> Result<(), PlatformError> {
        channel_id
            .send_message(&self.ctx.http, reply.clone().fit().to_message())
            .await?;
        Ok(())
    }

    async fn shutdown(&self) {
        self.ctx.shard.shutdown_clean();
    }
}

/// Voice transport backed by a Songbird call
pub struct SongbirdClient {
    manager: Arc<Songbird>,
    guild_id: GuildId,
    call: Arc<Mutex<Call>>,
    track: parking_lot::Mutex<Option<TrackHandle>>,
}

#[serenity::async_trait]
impl VoiceClient for SongbirdClient {
    async fn is_playing(&self) -> bool {
        let Some(track) = self.track.lock().clone() else {
            return false;
        };

        // A finished or errored track reports an error here
        match track.get_info().await {
            Ok(state) => state.playing == PlayMode::Play,
            Err(_) => false,
        }
    }

    async fn stop(&self) {
        self.call.lock().await.stop();
        self.track.lock().take();
    }

    async fn play(&self, source: &Path) -> Result<(), VoiceError> {
        if let Err(e) = tokio::fs::metadata(source).await {
            return Err(VoiceError::Playback {
                path: source.to_path_buf(),
                reason: e.to_string(),
            });
        }

        let input = File::new(source.to_path_buf());
        let track = self.call.lock().await.play_input(input.into());
        *self.track.lock() = Some(track);
        Ok(())
    }

    async fn leave(&self) -> Result<(), PlatformError> {
        self.track.lock().take();
        self.manager.remove(self.guild_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_and_resolving_agree_on_channel_kinds() {
        assert_eq!(channel_kind(ChannelType::Text), ChannelKind::Text);
        assert_eq!(channel_kind(ChannelType::News), ChannelKind::Text);
        assert_eq!(channel_kind(ChannelType::Voice), ChannelKind::Voice);
        assert_eq!(channel_kind(ChannelType::Stage), ChannelKind::Voice);
        assert_eq!(channel_kind(ChannelType::Category), ChannelKind::Other);
        assert_eq!(channel_kind(ChannelType::Forum), ChannelKind::Other);
    }
}
