use crate::{
    config::Config,
    guild::GuildRegistry,
    platform::Platform,
    validation::{AdminList, Validator},
    voice::VoiceController,
};
use std::time::Instant;
use tokio::sync::RwLock;

/// Per-guild payload of this bot.  Kept opaque and stored as-is.
pub type GuildPayload = serde_json::Value;

pub type Guilds = GuildRegistry<GuildPayload>;

/// Collection of data that is shared across events
pub struct Context<'a> {
    // Guildbot's own context types
    pub cfg: &'a RwLock<Config>,
    pub admins: &'a AdminList,
    pub guilds: &'a Guilds,
    pub voice: &'a VoiceController,
    pub started: Instant,
    // Discord, or a stand-in for it
    pub platform: &'a dyn Platform,
}

impl<'a> Context<'a> {
    pub fn validator(&self) -> Validator<'a> {
        Validator::new(self.admins, self.platform)
    }

    pub async fn prefix(&self) -> String {
        self.cfg.read().await.general.command_prefix.clone()
    }
}
