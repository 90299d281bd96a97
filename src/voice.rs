//! Voice connection and audio playback.
//!
//! The bot keeps at most one voice session for the whole process.  Connecting and disconnecting
//! take several awaited network steps, so both hold an exclusion lock for their entire duration;
//! otherwise two commands issued back-to-back could both see no session and both connect.

use crate::{
    error::{PlatformError, VoiceError},
    log_internal,
    platform::{ChannelInfo, Platform},
};
use serenity::all::UserId;
use std::{path::Path, sync::Arc};
use tokio::sync::Mutex;

/// Handle to an established voice transport
#[serenity::async_trait]
pub trait VoiceClient: Send + Sync {
    async fn is_playing(&self) -> bool;
    async fn stop(&self);
    async fn play(&self, source: &Path) -> Result<(), VoiceError>;
    /// Tear down the transport
    async fn leave(&self) -> Result<(), PlatformError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Connecting,
    Connected,
    Disconnecting,
}

#[derive(Clone)]
struct VoiceSession {
    channel: ChannelInfo,
    client: Arc<dyn VoiceClient>,
}

struct Slot {
    state: VoiceState,
    session: Option<VoiceSession>,
}

pub struct VoiceController {
    /// Held across connect, disconnect and member eviction
    lock: Mutex<()>,
    /// Only ever locked briefly, never across an await
    slot: parking_lot::Mutex<Slot>,
}

impl Default for VoiceController {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceController {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            slot: parking_lot::Mutex::new(Slot {
                state: VoiceState::Idle,
                session: None,
            }),
        }
    }

    pub fn state(&self) -> VoiceState {
        self.slot.lock().state
    }

    /// Channel of the active session
    pub fn channel(&self) -> Option<ChannelInfo> {
        self.slot
            .lock()
            .session
            .as_ref()
            .map(|session| session.channel.clone())
    }

    fn session(&self) -> Option<VoiceSession> {
        self.slot.lock().session.clone()
    }

    fn set_state(&self, state: VoiceState) {
        self.slot.lock().state = state;
    }

    /// Join `channel`.  Does nothing if a session already exists, whichever channel it is in.
    pub async fn connect(
        &self,
        platform: &dyn Platform,
        channel: &ChannelInfo,
    ) -> Result<(), VoiceError> {
        let _guard = self.lock.lock().await;

        if let Some(active) = self.channel() {
            log_internal!(
                "Already connected to voice channel \"{}\", not joining \"{}\"",
                active.name,
                channel.name
            );
            return Ok(());
        }

        let Some(guild_id) = channel.guild_id else {
            return Err(PlatformError::Other(format!(
                "channel {} does not belong to a guild",
                channel.id
            ))
            .into());
        };

        log_internal!("Connecting to voice channel \"{}\"... ", channel.name);
        self.set_state(VoiceState::Connecting);

        let client = match platform.connect_voice(guild_id, channel.id).await {
            Ok(client) => client,
            Err(e) => {
                self.set_state(VoiceState::Idle);
                return Err(e.into());
            }
        };

        // A transport reused from a stale session may still be streaming
        if client.is_playing().await {
            client.stop().await;
        }

        {
            let mut slot = self.slot.lock();
            slot.session = Some(VoiceSession {
                channel: channel.clone(),
                client,
            });
            slot.state = VoiceState::Connected;
        }

        log_internal!("Connecting to voice channel \"{}\"... done", channel.name);
        Ok(())
    }

    /// Leave the active session.  Does nothing when idle.
    pub async fn disconnect(&self) -> Result<(), VoiceError> {
        let _guard = self.lock.lock().await;

        let Some(session) = self.session() else {
            return Ok(());
        };

        log_internal!("Disconnecting from voice channel \"{}\"... ", session.channel.name);
        self.set_state(VoiceState::Disconnecting);

        let result = session.client.leave().await;

        // The session is gone either way; a later connect must start clean.
        {
            let mut slot = self.slot.lock();
            slot.session = None;
            slot.state = VoiceState::Idle;
        }

        result?;
        log_internal!(
            "Disconnecting from voice channel \"{}\"... done",
            session.channel.name
        );
        Ok(())
    }

    /// Play an audio file, replacing whatever is playing.  Does nothing when not connected.
    ///
    /// Does not wait on the connect/disconnect lock.  Callers must not issue overlapping plays.
    pub async fn play_audio(&self, source: &Path) -> Result<(), VoiceError> {
        let Some(session) = self.session() else {
            return Ok(());
        };

        log_internal!(
            "Playing \"{}\" in voice channel \"{}\"",
            source.to_string_lossy(),
            session.channel.name
        );

        if session.client.is_playing().await {
            session.client.stop().await;
        }
        session.client.play(source).await
    }

    /// Members of the active channel, the bot included
    pub async fn members(&self, platform: &dyn Platform) -> Result<Vec<UserId>, VoiceError> {
        let Some(session) = self.session() else {
            return Ok(Vec::new());
        };
        let Some(guild_id) = session.channel.guild_id else {
            return Ok(Vec::new());
        };

        Ok(platform.voice_members(guild_id, session.channel.id).await?)
    }

    /// Move everyone but the bot out of the active channel.  Returns how many members were
    /// moved.
    pub async fn remove_all_members(&self, platform: &dyn Platform) -> Result<usize, VoiceError> {
        let _guard = self.lock.lock().await;

        let Some(session) = self.session() else {
            return Ok(0);
        };
        let Some(guild_id) = session.channel.guild_id else {
            return Ok(0);
        };

        let me = platform.current_user_id();
        let members = platform.voice_members(guild_id, session.channel.id).await?;

        let mut removed = 0;
        for member in members.into_iter().filter(|member| *member != me) {
            platform.disconnect_member(guild_id, member).await?;
            removed += 1;
        }

        log_internal!(
            "Removed {} member(s) from voice channel \"{}\"",
            removed,
            session.channel.name
        );
        Ok(removed)
    }
}
