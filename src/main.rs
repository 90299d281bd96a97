mod config;
mod context;
mod discord;
mod error;
mod event;
mod guild;
mod handler;
mod logging;
mod platform;
mod plugin;
mod reply;
mod validation;
mod voice;

#[cfg(test)]
mod testing;

use crate::{
    config::{Backend, Config},
    context::Guilds,
    guild::store::{FileStore, GuildStore, SqliteStore},
};
use serenity::{all::GatewayIntents, Client};
use songbird::SerenityInit;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let cfg = Config::load().await?;
    let token = cfg.general.discord_token.clone();

    let store: Arc<dyn GuildStore> = match cfg.storage.backend {
        Backend::File => {
            log_internal!(
                "Storing guilds in `{}`",
                cfg.storage.guilds_dir.to_string_lossy()
            );
            Arc::new(FileStore::new(&cfg.storage.guilds_dir))
        }
        Backend::Sqlite => {
            log_internal!(
                "Storing guilds in `{}`",
                cfg.storage.database_path.to_string_lossy()
            );
            Arc::new(SqliteStore::open(&cfg.storage.database_path).await?)
        }
    };
    let guilds = Guilds::new(store, serde_json::json!({}));
    let handler = handler::Handler::new(cfg, guilds);

    // Things we want discord to tell us about.
    let intents = GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(&token, intents)
        .event_handler(handler)
        .register_songbird()
        .await?
        .start()
        .await
        .map_err(Into::into)
}
