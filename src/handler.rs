use crate::{
    config::Config,
    context::{Context, Guilds},
    discord::SerenityPlatform,
    event::Event,
    log_internal,
    platform::Platform,
    validation::{AdminList, Invocation, Origin},
    voice::VoiceController,
};
use rand::seq::SliceRandom;
use serenity::all::{ActivityData, Guild, Message, Ready, UnavailableGuild};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

const ACTIVITY_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Discord event handler
pub struct Handler {
    cfg: RwLock<Config>,
    admins: AdminList,
    guilds: Guilds,
    voice: VoiceController,
    started: Instant,
    rotating_activity: AtomicBool,
}

impl<'a> Handler {
    pub fn new(cfg: Config, guilds: Guilds) -> Self {
        Self {
            admins: cfg.admins(),
            cfg: RwLock::new(cfg),
            guilds,
            voice: VoiceController::new(),
            started: Instant::now(),
            rotating_activity: AtomicBool::new(false),
        }
    }

    fn ctx(&'a self, platform: &'a dyn Platform) -> Context<'a> {
        Context {
            cfg: &self.cfg,
            admins: &self.admins,
            guilds: &self.guilds,
            voice: &self.voice,
            started: self.started,
            platform,
        }
    }

    /// Pick a new "playing" status every hour.  Only the first ready event starts the rotation.
    async fn rotate_activity(&self, discord_ctx: &serenity::all::Context) {
        if self.rotating_activity.swap(true, Ordering::SeqCst) {
            return;
        }

        let activities = self.cfg.read().await.general.activities.clone();
        if activities.is_empty() {
            return;
        }

        let discord_ctx = discord_ctx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(ACTIVITY_PERIOD);
            loop {
                interval.tick().await;
                if let Some(activity) = pick_activity(&activities) {
                    log_internal!("Setting activity \"{}\"", activity);
                    discord_ctx.set_activity(Some(ActivityData::playing(activity)));
                }
            }
        });
    }
}

fn pick_activity(activities: &[String]) -> Option<String> {
    activities.choose(&mut rand::thread_rng()).cloned()
}

#[serenity::async_trait]
impl serenity::all::EventHandler for Handler {
    async fn ready(&self, discord_ctx: serenity::all::Context, ready: Ready) {
        let platform = SerenityPlatform::new(&discord_ctx);
        let guilds = ready.guilds.iter().map(|guild| guild.id).collect();
        Event::Ready { guilds }.handle(self.ctx(&platform)).await;

        self.rotate_activity(&discord_ctx).await;
    }

    async fn guild_create(
        &self,
        discord_ctx: serenity::all::Context,
        guild: Guild,
        is_new: Option<bool>,
    ) {
        // Guilds the bot was already in show up here too after `ready`
        if is_new != Some(true) {
            return;
        }

        let platform = SerenityPlatform::new(&discord_ctx);
        Event::GuildJoin(guild.id)
            .handle(self.ctx(&platform))
            .await;
    }

    async fn guild_delete(
        &self,
        discord_ctx: serenity::all::Context,
        incomplete: UnavailableGuild,
        _full: Option<Guild>,
    ) {
        // `unavailable` means an outage, not that the bot was removed
        if incomplete.unavailable {
            return;
        }

        let platform = SerenityPlatform::new(&discord_ctx);
        Event::GuildLeave(incomplete.id)
            .handle(self.ctx(&platform))
            .await;
    }

    async fn message(&self, discord_ctx: serenity::all::Context, msg: Message) {
        // Never react to bots, ourselves included
        if msg.author.bot {
            return;
        }

        let prefix = self.cfg.read().await.general.command_prefix.clone();
        let origin = Origin {
            author_id: msg.author.id,
            author_name: msg.author.name.clone(),
            guild_id: msg.guild_id,
            channel_id: msg.channel_id,
        };
        let Some(inv) = Invocation::parse(&prefix, &msg.content, origin) else {
            return;
        };

        let platform = SerenityPlatform::new(&discord_ctx);
        Event::Command(inv).handle(self.ctx(&platform)).await;
    }
}
