use super::{data::GuildData, state::GuildState, store::GuildStore};
use crate::{error::StoreError, log_internal, log_warn};
use serenity::all::GuildId;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};

pub type SharedGuild<D> = Arc<Mutex<GuildState<D>>>;

/// All guilds the bot is currently a member of, at most one [`GuildState`] each
pub struct GuildRegistry<D: GuildData> {
    store: Arc<dyn GuildStore>,
    default_data: D,
    guilds: RwLock<HashMap<GuildId, SharedGuild<D>>>,
}

impl<D: GuildData> GuildRegistry<D> {
    /// `default_data` is what a guild without stored data starts out with
    pub fn new(store: Arc<dyn GuildStore>, default_data: D) -> Self {
        Self {
            store,
            default_data,
            guilds: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, guild_id: GuildId) -> Option<SharedGuild<D>> {
        self.guilds.read().await.get(&guild_id).cloned()
    }

    /// The guild's state, creating its stored record and loading it on first sight
    pub async fn ensure(&self, guild_id: GuildId) -> Result<SharedGuild<D>, StoreError> {
        if let Some(guild) = self.get(guild_id).await {
            return Ok(guild);
        }

        // Check again under the write lock, another task may have won the race
        let mut guilds = self.guilds.write().await;
        if let Some(guild) = guilds.get(&guild_id) {
            return Ok(guild.clone());
        }

        self.store.insert_if_absent(guild_id).await?;
        let state =
            GuildState::load(self.store.clone(), guild_id, self.default_data.clone()).await?;
        let guild = Arc::new(Mutex::new(state));
        guilds.insert(guild_id, guild.clone());

        log_internal!("Loaded guild {}", guild_id);
        Ok(guild)
    }

    /// Load every given guild.  Guilds with unreadable records are skipped.
    ///
    /// Returns how many guilds are loaded afterwards.
    pub async fn load_all(&self, guild_ids: impl IntoIterator<Item = GuildId>) -> usize {
        for guild_id in guild_ids {
            if let Err(e) = self.ensure(guild_id).await {
                log_warn!("Skipping guild {}: {}", guild_id, e);
            }
        }

        self.len().await
    }

    /// Forget a guild.  Its stored record stays.
    pub async fn remove(&self, guild_id: GuildId) -> bool {
        self.guilds.write().await.remove(&guild_id).is_some()
    }

    /// Forget a guild and delete its stored record.
    ///
    /// Commands still holding the old instance can no longer write through it, so the record
    /// stays deleted until the next [`Self::ensure`].
    pub async fn purge(&self, guild_id: GuildId) -> Result<(), StoreError> {
        // Hold the map so no `ensure` recreates the record halfway through
        let mut guilds = self.guilds.write().await;
        match guilds.remove(&guild_id) {
            Some(guild) => guild.lock().await.purge().await,
            None => self.store.delete(guild_id).await,
        }
    }

    /// Bring a guild back to default settings and data.
    ///
    /// A loaded guild is reset in place under its lock, so there is never a second instance.
    /// An unreadable record is purged and created anew.
    pub async fn reset(&self, guild_id: GuildId) -> Result<SharedGuild<D>, StoreError> {
        let guild = match self.ensure(guild_id).await {
            Ok(guild) => guild,
            Err(e) if e.is_corrupt() => {
                log_warn!("Discarding unreadable record of guild {}: {}", guild_id, e);
                self.purge(guild_id).await?;
                return self.ensure(guild_id).await;
            }
            Err(e) => return Err(e),
        };

        guild.lock().await.reset(self.default_data.clone()).await?;
        Ok(guild)
    }

    /// Write settings and data of a loaded guild.  Returns `false` if the guild is not loaded.
    pub async fn save(&self, guild_id: GuildId) -> Result<bool, StoreError> {
        let Some(guild) = self.get(guild_id).await else {
            return Ok(false);
        };

        let guild = guild.lock().await;
        guild.write_settings().await?;
        guild.write_data().await?;
        Ok(true)
    }

    /// Write every loaded guild, carrying on past failures.  Returns how many were written.
    pub async fn save_all(&self) -> usize {
        let mut saved = 0;
        for guild_id in self.ids().await {
            match self.save(guild_id).await {
                Ok(true) => saved += 1,
                Ok(false) => {}
                Err(e) => log_warn!("Could not save guild {}: {}", guild_id, e),
            }
        }
        saved
    }

    pub async fn len(&self) -> usize {
        self.guilds.read().await.len()
    }

    /// Ids of all loaded guilds, sorted
    pub async fn ids(&self) -> Vec<GuildId> {
        let mut ids: Vec<_> = self.guilds.read().await.keys().copied().collect();
        ids.sort();
        ids
    }
}
