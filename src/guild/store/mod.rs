//! Where guild settings and data live between sessions

mod file;
mod sqlite;

pub use file::FileStore;
pub use sqlite::SqliteStore;

use super::settings::GuildSettings;
use crate::error::StoreError;
use serde_json::Value;
use serenity::all::GuildId;

/// Persistence backend for guild records.
///
/// Absent records read as `Ok(None)`.  Writes overwrite and may be repeated.
#[serenity::async_trait]
pub trait GuildStore: Send + Sync {
    /// Create a minimal record for the guild unless one exists.  Never touches existing data.
    async fn insert_if_absent(&self, guild_id: GuildId) -> Result<(), StoreError>;
    async fn read_settings(&self, guild_id: GuildId) -> Result<Option<GuildSettings>, StoreError>;
    async fn write_settings(
        &self,
        guild_id: GuildId,
        settings: &GuildSettings,
    ) -> Result<(), StoreError>;
    async fn read_data(&self, guild_id: GuildId) -> Result<Option<Value>, StoreError>;
    async fn write_data(&self, guild_id: GuildId, data: &Value) -> Result<(), StoreError>;
    /// Remove everything stored for the guild
    async fn delete(&self, guild_id: GuildId) -> Result<(), StoreError>;
}
