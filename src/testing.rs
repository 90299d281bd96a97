//! In-memory platform and a fully wired bot used by the unit tests

use crate::{
    config::Config,
    context::{Context, Guilds},
    error::{PlatformError, VoiceError},
    event::Event,
    guild::store::FileStore,
    platform::{ChannelInfo, ChannelKind, Platform},
    reply::Reply,
    validation::{AdminList, Invocation, Origin},
    voice::{VoiceClient, VoiceController},
};
use parking_lot::Mutex;
use serenity::all::{ChannelId, GuildId, UserId};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

pub const BOT_USER_ID: u64 = 999;
pub const ADMIN_ID: u64 = 1;
pub const MEMBER_ID: u64 = 2;
pub const GUILD_ID: u64 = 42;
/// Text channel every [`TestBot`] command is sent from
pub const COMMAND_CHANNEL_ID: u64 = 10;

#[derive(Default)]
struct State {
    channels: Vec<ChannelInfo>,
    voice_members: HashMap<ChannelId, Vec<UserId>>,
    sent: Vec<(ChannelId, Reply)>,
    voice_connects: Vec<ChannelId>,
    voice_clients: Vec<Arc<FakeVoiceClient>>,
    disconnected: Vec<UserId>,
    fail_connects: bool,
    fail_listing: bool,
    next_client_playing: bool,
    connect_delay: Option<Duration>,
    shutdowns: usize,
}

#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<State>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_channel(
        &self,
        guild_id: GuildId,
        id: u64,
        name: &str,
        kind: ChannelKind,
    ) -> ChannelInfo {
        let channel = ChannelInfo {
            id: ChannelId::new(id),
            guild_id: Some(guild_id),
            name: name.to_owned(),
            kind,
        };
        self.state.lock().channels.push(channel.clone());
        channel
    }

    pub fn add_text_channel(&self, guild_id: GuildId, id: u64, name: &str) -> ChannelInfo {
        self.add_channel(guild_id, id, name, ChannelKind::Text)
    }

    pub fn add_voice_channel(&self, guild_id: GuildId, id: u64, name: &str) -> ChannelInfo {
        self.add_channel(guild_id, id, name, ChannelKind::Voice)
    }

    pub fn remove_channel(&self, id: u64) {
        self.state
            .lock()
            .channels
            .retain(|channel| channel.id != ChannelId::new(id));
    }

    pub fn set_voice_members(&self, channel_id: ChannelId, members: Vec<UserId>) {
        self.state.lock().voice_members.insert(channel_id, members);
    }

    pub fn fail_voice_connects(&self) {
        self.state.lock().fail_connects = true;
    }

    pub fn fail_channel_listing(&self) {
        self.state.lock().fail_listing = true;
    }

    pub fn next_client_playing(&self) {
        self.state.lock().next_client_playing = true;
    }

    pub fn delay_voice_connects(&self, delay: Duration) {
        self.state.lock().connect_delay = Some(delay);
    }

    pub fn sent(&self) -> Vec<(ChannelId, Reply)> {
        self.state.lock().sent.clone()
    }

    pub fn voice_connects(&self) -> Vec<ChannelId> {
        self.state.lock().voice_connects.clone()
    }

    pub fn voice_clients(&self) -> Vec<Arc<FakeVoiceClient>> {
        self.state.lock().voice_clients.clone()
    }

    pub fn disconnected_members(&self) -> Vec<UserId> {
        self.state.lock().disconnected.clone()
    }

    pub fn shutdowns(&self) -> usize {
        self.state.lock().shutdowns
    }

    fn guild_channels(
        &self,
        guild_id: GuildId,
        kind: ChannelKind,
    ) -> Result<Vec<ChannelInfo>, PlatformError> {
        let state = self.state.lock();
        if state.fail_listing {
            return Err(PlatformError::Other("channel listing unavailable".to_owned()));
        }
        Ok(state
            .channels
            .iter()
            .filter(|channel| channel.guild_id == Some(guild_id) && channel.kind == kind)
            .cloned()
            .collect())
    }
}

#[serenity::async_trait]
impl Platform for FakePlatform {
    fn current_user_id(&self) -> UserId {
        UserId::new(BOT_USER_ID)
    }

    async fn channel(&self, channel_id: ChannelId) -> Option<ChannelInfo> {
        self.state
            .lock()
            .channels
            .iter()
            .find(|channel| channel.id == channel_id)
            .cloned()
    }

    async fn text_channels(&self, guild_id: GuildId) -> Result<Vec<ChannelInfo>, PlatformError> {
        self.guild_channels(guild_id, ChannelKind::Text)
    }

    async fn voice_channels(&self, guild_id: GuildId) -> Result<Vec<ChannelInfo>, PlatformError> {
        self.guild_channels(guild_id, ChannelKind::Voice)
    }

    async fn voice_members(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Vec<UserId>, PlatformError> {
        Ok(self
            .state
            .lock()
            .voice_members
            .get(&channel_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn disconnect_member(
        &self,
        _guild_id: GuildId,
        user_id: UserId,
    ) -> Result<(), PlatformError> {
        self.state.lock().disconnected.push(user_id);
        Ok(())
    }

    async fn connect_voice(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<dyn VoiceClient>, PlatformError> {
        let delay = self.state.lock().connect_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.fail_connects {
            return Err(PlatformError::Other("voice gateway timed out".to_owned()));
        }

        let client = Arc::new(FakeVoiceClient::new(state.next_client_playing));
        state.next_client_playing = false;
        state.voice_connects.push(channel_id);
        state.voice_clients.push(client.clone());
        Ok(client)
    }

    async fn send_message(
        &self,
        channel_id: ChannelId,
        reply: &Reply,
    ) -> Result<(), PlatformError> {
        self.state.lock().sent.push((channel_id, reply.clone()));
        Ok(())
    }

    async fn shutdown(&self) {
        self.state.lock().shutdowns += 1;
    }
}

#[derive(Default)]
struct ClientState {
    playing: bool,
    stops: usize,
    left: usize,
    played: Vec<PathBuf>,
}

pub struct FakeVoiceClient {
    state: Mutex<ClientState>,
}

impl FakeVoiceClient {
    fn new(playing: bool) -> Self {
        Self {
            state: Mutex::new(ClientState {
                playing,
                ..Default::default()
            }),
        }
    }

    pub fn playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn stops(&self) -> usize {
        self.state.lock().stops
    }

    pub fn left(&self) -> usize {
        self.state.lock().left
    }

    pub fn played(&self) -> Vec<PathBuf> {
        self.state.lock().played.clone()
    }
}

#[serenity::async_trait]
impl VoiceClient for FakeVoiceClient {
    async fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    async fn stop(&self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.stops += 1;
    }

    async fn play(&self, source: &Path) -> Result<(), VoiceError> {
        let mut state = self.state.lock();
        state.playing = true;
        state.played.push(source.to_path_buf());
        Ok(())
    }

    async fn leave(&self) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        state.playing = false;
        state.left += 1;
        Ok(())
    }
}

/// Everything a plugin sees, backed by [`FakePlatform`] and a temporary file store
pub struct TestBot {
    pub cfg: RwLock<Config>,
    pub admins: AdminList,
    pub guilds: Guilds,
    pub voice: VoiceController,
    pub platform: FakePlatform,
    pub started: Instant,
    pub dir: tempfile::TempDir,
}

impl TestBot {
    /// Prefix `;`, one admin, and guild [`GUILD_ID`] with a `#general` text channel
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::from_toml_str(&format!(
            r#"
            [general]
            discord_token = "token"
            command_prefix = ";"
            bot_admins = [{ADMIN_ID}]
            goodbye_message = "Bye"
            "#
        ))
        .unwrap();
        cfg.resolve_paths(dir.path());

        let store = Arc::new(FileStore::new(&cfg.storage.guilds_dir));
        let platform = FakePlatform::new();
        platform.add_text_channel(Self::guild(), COMMAND_CHANNEL_ID, "general");

        Self {
            admins: cfg.admins(),
            guilds: Guilds::new(store, serde_json::json!({})),
            cfg: RwLock::new(cfg),
            voice: VoiceController::new(),
            platform,
            started: Instant::now(),
            dir,
        }
    }

    pub fn guild() -> GuildId {
        GuildId::new(GUILD_ID)
    }

    pub fn ctx(&self) -> Context<'_> {
        Context {
            cfg: &self.cfg,
            admins: &self.admins,
            guilds: &self.guilds,
            voice: &self.voice,
            started: self.started,
            platform: &self.platform,
        }
    }

    pub async fn dispatch(&self, event: Event) {
        event.handle(self.ctx()).await;
    }

    /// Send `content` from `author` in the guild's command channel.  Returns the replies it caused.
    pub async fn command(&self, author: u64, content: &str) -> Vec<Reply> {
        self.command_in(author, Some(Self::guild()), content).await
    }

    /// Send `content` from `author` in a direct message
    pub async fn dm_command(&self, author: u64, content: &str) -> Vec<Reply> {
        self.command_in(author, None, content).await
    }

    async fn command_in(
        &self,
        author: u64,
        guild_id: Option<GuildId>,
        content: &str,
    ) -> Vec<Reply> {
        let origin = Origin {
            author_id: UserId::new(author),
            author_name: format!("user{}", author),
            guild_id,
            channel_id: ChannelId::new(COMMAND_CHANNEL_ID),
        };
        let inv = Invocation::parse(";", content, origin).unwrap();

        let before = self.platform.sent().len();
        self.dispatch(Event::Command(inv)).await;
        self.platform
            .sent()
            .into_iter()
            .skip(before)
            .map(|(_, reply)| reply)
            .collect()
    }
}
