//! Error types for the guild store, the chat platform and the voice session.
//!
//! Plugins and `main` work with `anyhow::Result`; these typed errors exist so that the core can
//! tell a corrupt record apart from an unreachable platform.

use serenity::all::GuildId;
use std::path::PathBuf;
use thiserror::Error;

/// Guild persistence errors.
///
/// A missing record is never an error; stores report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not access `{}`: {source}", path.to_string_lossy())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("stored {what} for guild {guild_id} is malformed: {reason}")]
    Corrupt {
        guild_id: GuildId,
        what: &'static str,
        reason: String,
    },
    #[error("could not serialize {what} for guild {guild_id}: {source}")]
    Serialize {
        guild_id: GuildId,
        what: &'static str,
        source: serde_json::Error,
    },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("guild {0} was purged")]
    Purged(GuildId),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

/// The chat platform could not be reached or refused a request.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("discord request failed: {0}")]
    Discord(#[from] serenity::Error),
    #[error("could not join voice channel: {0}")]
    VoiceJoin(#[from] songbird::error::JoinError),
    #[error("voice support is not registered with the client")]
    VoiceUnavailable,
    #[error("{0}")]
    Other(String),
}

/// Voice session errors.
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("could not play `{}`: {reason}", path.to_string_lossy())]
    Playback { path: PathBuf, reason: String },
}
