use super::GuildStore;
use crate::{error::StoreError, guild::settings::GuildSettings};
use serde_json::Value;
use serenity::all::GuildId;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::path::Path;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS guild (
        id INTEGER PRIMARY KEY NOT NULL,
        main_channel_id INTEGER,
        voice_channel_id INTEGER,
        data TEXT
    );
"#;

/// One row per guild in a SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

// SQLite integers are signed 64-bit; Discord snowflakes fit below 2^63.
fn to_db(id: u64) -> i64 {
    id as i64
}

fn from_db(id: Option<i64>) -> u64 {
    id.map(|id| id as u64).unwrap_or(0)
}

fn nullable(id: u64) -> Option<i64> {
    (id != 0).then(|| to_db(id))
}

impl SqliteStore {
    /// Open (creating if missing) the database at `path` and make sure the schema exists.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::with_pool(pool).await
    }

    /// Use an existing pool, e.g. an in-memory database.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

#[serenity::async_trait]
impl GuildStore for SqliteStore {
    async fn insert_if_absent(&self, guild_id: GuildId) -> Result<(), StoreError> {
        sqlx::query("INSERT OR IGNORE INTO guild (id) VALUES (?)")
            .bind(to_db(guild_id.get()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn read_settings(&self, guild_id: GuildId) -> Result<Option<GuildSettings>, StoreError> {
        let row = sqlx::query_as::<_, (Option<i64>, Option<i64>)>(
            "SELECT main_channel_id, voice_channel_id FROM guild WHERE id = ?",
        )
        .bind(to_db(guild_id.get()))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(main_channel_id, voice_channel_id)| GuildSettings {
            guild_id: guild_id.get(),
            main_channel_id: from_db(main_channel_id),
            voice_channel_id: from_db(voice_channel_id),
        }))
    }

    async fn write_settings(
        &self,
        guild_id: GuildId,
        settings: &GuildSettings,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO guild (id, main_channel_id, voice_channel_id)
            VALUES (?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                main_channel_id = excluded.main_channel_id,
                voice_channel_id = excluded.voice_channel_id
            "#,
        )
        .bind(to_db(guild_id.get()))
        .bind(nullable(settings.main_channel_id))
        .bind(nullable(settings.voice_channel_id))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn read_data(&self, guild_id: GuildId) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query_as::<_, (Option<String>,)>("SELECT data FROM guild WHERE id = ?")
            .bind(to_db(guild_id.get()))
            .fetch_optional(&self.pool)
            .await?;

        let Some((Some(data),)) = row else {
            return Ok(None);
        };

        serde_json::from_str(&data)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                guild_id,
                what: "data",
                reason: e.to_string(),
            })
    }

    async fn write_data(&self, guild_id: GuildId, data: &Value) -> Result<(), StoreError> {
        let data = serde_json::to_string(data).map_err(|source| StoreError::Serialize {
            guild_id,
            what: "data",
            source,
        })?;

        sqlx::query(
            r#"
            INSERT INTO guild (id, data) VALUES (?, ?)
            ON CONFLICT (id) DO UPDATE SET data = excluded.data
            "#,
        )
        .bind(to_db(guild_id.get()))
        .bind(data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, guild_id: GuildId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM guild WHERE id = ?")
            .bind(to_db(guild_id.get()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
