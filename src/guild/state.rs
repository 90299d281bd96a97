use super::{data::GuildData, settings::GuildSettings, store::GuildStore};
use crate::{
    error::StoreError,
    log_internal,
    platform::{ChannelInfo, ChannelKind, Platform},
};
use serenity::all::{ChannelId, GuildId};
use std::sync::Arc;

/// Everything the bot keeps about one guild
pub struct GuildState<D: GuildData> {
    id: GuildId,
    store: Arc<dyn GuildStore>,
    settings: GuildSettings,
    data: D,
    // Resolved handles, refreshed lazily and allowed to go stale
    main_channel: Option<ChannelInfo>,
    voice_channel: Option<ChannelInfo>,
    // Set once the stored record is deleted; later writes must not bring it back
    purged: bool,
}

impl<D: GuildData> GuildState<D> {
    /// Settings and data as persisted, falling back to defaults for whatever is missing.
    ///
    /// Defaults are not written back.  A malformed record aborts the load.
    pub async fn load(
        store: Arc<dyn GuildStore>,
        guild_id: GuildId,
        default_data: D,
    ) -> Result<Self, StoreError> {
        let mut state = Self {
            id: guild_id,
            store,
            settings: GuildSettings::default_for(guild_id),
            data: default_data.clone(),
            main_channel: None,
            voice_channel: None,
            purged: false,
        };

        state.load_settings().await?;
        state.load_data(default_data).await?;

        Ok(state)
    }

    pub fn settings(&self) -> &GuildSettings {
        &self.settings
    }

    #[allow(dead_code)] // no command keeps per-guild data yet
    pub fn data(&self) -> &D {
        &self.data
    }

    /// Changes are only persisted by [`Self::write_data`]
    #[allow(dead_code)]
    pub fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    pub async fn load_settings(&mut self) -> Result<(), StoreError> {
        let settings = match self.store.read_settings(self.id).await? {
            Some(settings) => settings,
            None => GuildSettings::default_for(self.id),
        };

        if settings.guild_id != self.id.get() {
            return Err(StoreError::Corrupt {
                guild_id: self.id,
                what: "settings",
                reason: format!("record belongs to guild {}", settings.guild_id),
            });
        }

        self.settings = settings;
        self.main_channel = None;
        self.voice_channel = None;
        Ok(())
    }

    pub async fn load_data(&mut self, default: D) -> Result<(), StoreError> {
        let Some(payload) = self.store.read_data(self.id).await? else {
            self.data = default;
            return Ok(());
        };

        let mut data = default;
        if let Err(e) = data.apply_loaded_data(payload) {
            log_internal!("Could not apply stored data of guild {}: {}", self.id, e);
            return Err(StoreError::Corrupt {
                guild_id: self.id,
                what: "data",
                reason: e.to_string(),
            });
        }

        self.data = data;
        Ok(())
    }

    pub async fn write_settings(&self) -> Result<(), StoreError> {
        if self.purged {
            return Err(StoreError::Purged(self.id));
        }
        self.store.write_settings(self.id, &self.settings).await
    }

    pub async fn write_data(&self) -> Result<(), StoreError> {
        if self.purged {
            return Err(StoreError::Purged(self.id));
        }
        self.store
            .write_data(self.id, &self.data.prepare_data())
            .await
    }

    /// Persist a new main channel.  The setting is stored before this returns; on failure the
    /// previous channel stays in effect.
    pub async fn update_main_channel(
        &mut self,
        platform: &dyn Platform,
        channel_id: ChannelId,
    ) -> Result<(), StoreError> {
        let previous = std::mem::replace(&mut self.settings.main_channel_id, channel_id.get());
        if let Err(e) = self.write_settings().await {
            self.settings.main_channel_id = previous;
            return Err(e);
        }
        self.main_channel = platform.channel(channel_id).await;
        Ok(())
    }

    /// Persist a new voice channel.  Same guarantees as [`Self::update_main_channel`].
    pub async fn update_voice_channel(
        &mut self,
        platform: &dyn Platform,
        channel_id: ChannelId,
    ) -> Result<(), StoreError> {
        let previous = std::mem::replace(&mut self.settings.voice_channel_id, channel_id.get());
        if let Err(e) = self.write_settings().await {
            self.settings.voice_channel_id = previous;
            return Err(e);
        }
        self.voice_channel = platform.channel(channel_id).await;
        Ok(())
    }

    /// Delete the stored record and start over from defaults, keeping this instance.
    pub async fn reset(&mut self, default_data: D) -> Result<(), StoreError> {
        self.store.delete(self.id).await?;
        self.settings = GuildSettings::default_for(self.id);
        self.data = default_data;
        self.main_channel = None;
        self.voice_channel = None;
        self.store.insert_if_absent(self.id).await
    }

    /// Delete the stored record.  Every later write through this instance fails.
    pub async fn purge(&mut self) -> Result<(), StoreError> {
        self.purged = true;
        self.store.delete(self.id).await
    }

    /// The configured main channel, or the guild's first text channel if it is gone
    pub async fn main_channel(&mut self, platform: &dyn Platform) -> Option<ChannelInfo> {
        let channel = self
            .resolve(platform, self.settings.main_channel(), ChannelKind::Text)
            .await;
        self.main_channel = channel.clone();
        channel
    }

    /// The configured voice channel, or the guild's first voice channel if it is gone
    pub async fn voice_channel(&mut self, platform: &dyn Platform) -> Option<ChannelInfo> {
        let channel = self
            .resolve(platform, self.settings.voice_channel(), ChannelKind::Voice)
            .await;
        self.voice_channel = channel.clone();
        channel
    }

    async fn resolve(
        &self,
        platform: &dyn Platform,
        configured: Option<ChannelId>,
        kind: ChannelKind,
    ) -> Option<ChannelInfo> {
        if let Some(channel_id) = configured {
            if let Some(channel) = platform.channel(channel_id).await {
                if channel.kind == kind {
                    return Some(channel);
                }
            }
        }

        let channels = match kind {
            ChannelKind::Voice => platform.voice_channels(self.id).await,
            _ => platform.text_channels(self.id).await,
        };

        match channels {
            Ok(channels) => channels.into_iter().next(),
            Err(e) => {
                log_internal!("Could not list channels of guild {}: {}", self.id, e);
                None
            }
        }
    }

    /// Last resolved main channel, without asking the platform
    pub fn main_channel_handle(&self) -> Option<&ChannelInfo> {
        self.main_channel.as_ref()
    }

    pub fn voice_channel_handle(&self) -> Option<&ChannelInfo> {
        self.voice_channel.as_ref()
    }
}
