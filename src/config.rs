use crate::validation::AdminList;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

const CONFIG_DIR_REL_HOME: &str = ".config/guildbot";
const CONFIG_FILE: &str = "config.toml";

/// Bot configuration
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub general: General,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub voice: Voice,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct General {
    pub discord_token: String,
    pub command_prefix: String,
    /// User ids allowed to run admin commands
    #[serde(default)]
    pub bot_admins: Vec<u64>,
    /// "Playing ..." statuses, one picked at random every hour
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default = "default_goodbye")]
    pub goodbye_message: String,
    /// Linked from the `info` reply
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Sqlite,
}

/// Relative paths are relative to the configuration directory
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Storage {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_guilds_dir")]
    pub guilds_dir: PathBuf,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Voice {
    /// Where `play` looks for clips
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,
}

fn default_goodbye() -> String {
    "Goodbye!".to_owned()
}

fn default_guilds_dir() -> PathBuf {
    PathBuf::from("guilds")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("guilds.sqlite")
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("audio")
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            guilds_dir: default_guilds_dir(),
            database_path: default_database_path(),
        }
    }
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            audio_dir: default_audio_dir(),
        }
    }
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_DIR_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    pub async fn load() -> Result<Self> {
        let dir = Self::config_dir()?;
        let path = dir.join(CONFIG_FILE);

        let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
            anyhow!(
                "Could not open configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let mut config = Self::from_toml_str(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;
        config.resolve_paths(&dir);

        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub async fn reload(&mut self) -> Result<()> {
        let new = Self::load().await?;
        *self = new;
        Ok(())
    }

    /// Anchor relative storage and audio paths at `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.storage.guilds_dir,
            &mut self.storage.database_path,
            &mut self.voice.audio_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    pub fn admins(&self) -> AdminList {
        AdminList::new(self.general.bot_admins.iter().copied())
    }
}
