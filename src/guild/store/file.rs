use super::GuildStore;
use crate::{error::StoreError, guild::settings::GuildSettings};
use serde_json::Value;
use serenity::all::GuildId;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// One `<id>_settings.json` and one `<id>_data.json` per guild in a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn settings_path(&self, guild_id: GuildId) -> PathBuf {
        self.dir.join(format!("{}_settings.json", guild_id))
    }

    fn data_path(&self, guild_id: GuildId) -> PathBuf {
        self.dir.join(format!("{}_data.json", guild_id))
    }

    async fn create_dir(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::io(&self.dir, e))
    }

    async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        self.create_dir().await?;

        // Write to a temporary file in the same directory, then atomically rename it over the
        // target so a crash never leaves a half-written record behind.
        let tmp_path = path.with_extension("json.new");
        tokio::fs::write(&tmp_path, contents)
            .await
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|e| StoreError::io(path, e))
    }

    async fn remove(&self, path: &Path) -> Result<(), StoreError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

fn to_json<T: serde::Serialize>(
    guild_id: GuildId,
    what: &'static str,
    value: &T,
) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serialize {
        guild_id,
        what,
        source,
    })
}

fn from_json<T: serde::de::DeserializeOwned>(
    guild_id: GuildId,
    what: &'static str,
    contents: &[u8],
) -> Result<T, StoreError> {
    serde_json::from_slice(contents).map_err(|e| StoreError::Corrupt {
        guild_id,
        what,
        reason: e.to_string(),
    })
}

#[serenity::async_trait]
impl GuildStore for FileStore {
    async fn insert_if_absent(&self, guild_id: GuildId) -> Result<(), StoreError> {
        self.create_dir().await?;

        let path = self.settings_path(guild_id);
        if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?
        {
            return Ok(());
        }
        let contents = to_json(guild_id, "settings", &GuildSettings::default_for(guild_id))?;

        // The record only appears once complete: the default is written to a private temporary
        // file and hard linked into place.  Linking fails if the target exists, so an existing
        // record is never reset, even by two concurrent calls.
        let tmp_path = path.with_extension(format!("json.{:016x}.new", rand::random::<u64>()));
        tokio::fs::write(&tmp_path, &contents)
            .await
            .map_err(|e| StoreError::io(&tmp_path, e))?;

        let linked = match tokio::fs::hard_link(&tmp_path, &path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(StoreError::io(&path, e)),
        };
        self.remove(&tmp_path).await?;
        linked
    }

    async fn read_settings(&self, guild_id: GuildId) -> Result<Option<GuildSettings>, StoreError> {
        match self.read(&self.settings_path(guild_id)).await? {
            Some(contents) => from_json(guild_id, "settings", &contents).map(Some),
            None => Ok(None),
        }
    }

    async fn write_settings(
        &self,
        guild_id: GuildId,
        settings: &GuildSettings,
    ) -> Result<(), StoreError> {
        let contents = to_json(guild_id, "settings", settings)?;
        self.write(&self.settings_path(guild_id), &contents).await
    }

    async fn read_data(&self, guild_id: GuildId) -> Result<Option<Value>, StoreError> {
        match self.read(&self.data_path(guild_id)).await? {
            Some(contents) => from_json(guild_id, "data", &contents).map(Some),
            None => Ok(None),
        }
    }

    async fn write_data(&self, guild_id: GuildId, data: &Value) -> Result<(), StoreError> {
        let contents = to_json(guild_id, "data", data)?;
        self.write(&self.data_path(guild_id), &contents).await
    }

    async fn delete(&self, guild_id: GuildId) -> Result<(), StoreError> {
        self.remove(&self.data_path(guild_id)).await?;
        self.remove(&self.settings_path(guild_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild() -> GuildId {
        GuildId::new(42)
    }

    #[tokio::test]
    async fn missing_records_read_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("guilds"));

        assert_eq!(store.read_settings(guild()).await.unwrap(), None);
        assert_eq!(store.read_data(guild()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn insert_if_absent_never_resets_existing_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.insert_if_absent(guild()).await.unwrap();
        assert_eq!(
            store.read_settings(guild()).await.unwrap(),
            Some(GuildSettings::default_for(guild()))
        );

        let updated = GuildSettings {
            main_channel_id: 100,
            ..GuildSettings::default_for(guild())
        };
        store.write_settings(guild(), &updated).await.unwrap();
        store.insert_if_absent(guild()).await.unwrap();

        assert_eq!(store.read_settings(guild()).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn insert_if_absent_only_leaves_a_complete_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        // Left behind by an insert that died before linking
        tokio::fs::write(dir.path().join("42_settings.json.00000000deadbeef.new"), b"")
            .await
            .unwrap();

        store.insert_if_absent(guild()).await.unwrap();

        let raw = tokio::fs::read(dir.path().join("42_settings.json"))
            .await
            .unwrap();
        let settings: GuildSettings = serde_json::from_slice(&raw).unwrap();
        assert_eq!(settings, GuildSettings::default_for(guild()));

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        assert_eq!(
            names,
            vec!["42_settings.json", "42_settings.json.00000000deadbeef.new"]
        );
    }

    #[tokio::test]
    async fn concurrent_inserts_agree_on_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FileStore::new(dir.path()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.insert_if_absent(guild()).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(
            store.read_settings(guild()).await.unwrap(),
            Some(GuildSettings::default_for(guild()))
        );
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn settings_use_the_flat_document_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let settings = GuildSettings {
            guild_id: 42,
            main_channel_id: 100,
            voice_channel_id: 200,
        };
        store.write_settings(guild(), &settings).await.unwrap();

        let raw = tokio::fs::read(dir.path().join("42_settings.json"))
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["Main channel ID"], 100);
        assert_eq!(json["Voice channel ID"], 200);
        assert!(!dir.path().join("42_settings.json.new").exists());
    }

    #[tokio::test]
    async fn malformed_records_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        tokio::fs::write(dir.path().join("42_settings.json"), b"{ not json")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("42_data.json"), b"[1, 2")
            .await
            .unwrap();

        assert!(store.read_settings(guild()).await.unwrap_err().is_corrupt());
        assert!(store.read_data(guild()).await.unwrap_err().is_corrupt());
    }

    #[tokio::test]
    async fn delete_removes_both_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.insert_if_absent(guild()).await.unwrap();
        store
            .write_data(guild(), &serde_json::json!({"greeting": "hi"}))
            .await
            .unwrap();

        store.delete(guild()).await.unwrap();
        store.delete(guild()).await.unwrap();

        assert_eq!(store.read_settings(guild()).await.unwrap(), None);
        assert_eq!(store.read_data(guild()).await.unwrap(), None);
    }
}
