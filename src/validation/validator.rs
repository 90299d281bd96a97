use super::{
    invocation::Invocation,
    rule::{Rejection, RuleSet, ValidationRule},
};
use crate::{
    log_internal, log_warn,
    platform::{ChannelInfo, Platform},
    reply::Reply,
};
use serenity::all::UserId;
use std::collections::HashSet;

/// Users allowed to run admin-only commands.  Built from configuration at startup and read-only
/// afterwards.
#[derive(Clone, Debug, Default)]
pub struct AdminList(HashSet<UserId>);

impl AdminList {
    pub fn new(ids: impl IntoIterator<Item = u64>) -> Self {
        Self(ids.into_iter().filter(|id| *id != 0).map(UserId::new).collect())
    }

    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.0.contains(&user_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureReason {
    NotAdmin,
    NoGuild,
    ArgCount,
    ArgFormat,
    ChannelMention,
    VoiceChannelNotFound,
}

impl From<&ValidationRule> for FailureReason {
    fn from(rule: &ValidationRule) -> Self {
        match rule {
            ValidationRule::RequireAdmin(_) => Self::NotAdmin,
            ValidationRule::RequireGuildContext(_) => Self::NoGuild,
            ValidationRule::RequireArgCount(..) => Self::ArgCount,
            ValidationRule::RequireArgFormat { .. } => Self::ArgFormat,
            ValidationRule::RequireChannelMention(_) => Self::ChannelMention,
            ValidationRule::RequireVoiceChannelByName { .. } => Self::VoiceChannelNotFound,
        }
    }
}

/// The first rule an invocation failed
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{reason:?}: {}", rejection.message)]
pub struct ValidationFailure {
    pub reason: FailureReason,
    pub rejection: Rejection,
}

/// Gate in front of every side-effecting command.
pub struct Validator<'a> {
    admins: &'a AdminList,
    platform: &'a dyn Platform,
}

impl<'a> Validator<'a> {
    pub fn new(admins: &'a AdminList, platform: &'a dyn Platform) -> Self {
        Self { admins, platform }
    }

    /// Run `rules` in order, stopping at the first failure.  Sends nothing.
    pub async fn check(&self, inv: &Invocation, rules: &RuleSet) -> Result<(), ValidationFailure> {
        for rule in rules.iter() {
            if !self.passes(inv, rule).await {
                return Err(ValidationFailure {
                    reason: FailureReason::from(rule),
                    rejection: rule.rejection().clone(),
                });
            }
        }
        Ok(())
    }

    /// Run `rules` and report the first failure to the invoking channel.
    ///
    /// Returns whether the command may proceed.  On `false` the user has already been told why;
    /// the caller must do nothing further.
    pub async fn evaluate(&self, inv: &Invocation, rules: &RuleSet) -> bool {
        let Err(failure) = self.check(inv, rules).await else {
            return true;
        };

        log_internal!(
            "Rejected `{}` from {} ({:?})",
            inv.command,
            inv.author_name,
            failure.reason
        );

        let reply = Reply::error(failure.rejection.message, failure.rejection.footer);
        if let Err(e) = self.platform.send_message(inv.channel_id, &reply).await {
            log_warn!("Could not deliver validation error for `{}`: {}", inv.command, e);
        }
        false
    }

    /// Mentioned channels that exist in the invoking guild, in order of appearance.
    ///
    /// Unknown ids and channels of other guilds are dropped, as are all mentions in direct
    /// messages.
    pub async fn guild_mentions(&self, inv: &Invocation) -> Vec<ChannelInfo> {
        let Some(guild_id) = inv.guild_id else {
            return Vec::new();
        };

        let mut channels = Vec::new();
        for &channel_id in &inv.mentioned_channels {
            match self.platform.channel(channel_id).await {
                Some(channel) if channel.guild_id == Some(guild_id) => channels.push(channel),
                _ => {}
            }
        }
        channels
    }

    async fn passes(&self, inv: &Invocation, rule: &ValidationRule) -> bool {
        match rule {
            ValidationRule::RequireAdmin(_) => self.admins.is_admin(inv.author_id),
            ValidationRule::RequireGuildContext(_) => inv.guild_id.is_some(),
            ValidationRule::RequireArgCount(count, _) => count.accepts(inv.args.len()),
            ValidationRule::RequireArgFormat { formats, exact, .. } => {
                if *exact {
                    formats.len() == inv.args.len()
                        && formats
                            .iter()
                            .zip(&inv.args)
                            .all(|(format, arg)| format.validate(arg))
                } else {
                    match formats.first() {
                        Some(format) => inv.args.iter().all(|arg| format.validate(arg)),
                        None => true,
                    }
                }
            }
            ValidationRule::RequireChannelMention(_) => self.guild_mentions(inv).await.len() == 1,
            ValidationRule::RequireVoiceChannelByName { position, .. } => {
                let (Some(guild_id), Some(name)) = (inv.guild_id, inv.args.get(*position)) else {
                    return false;
                };
                match self.platform.voice_channels(guild_id).await {
                    Ok(channels) => channels.iter().any(|channel| &channel.name == name),
                    Err(e) => {
                        log_warn!("Could not list voice channels of guild {}: {}", guild_id, e);
                        false
                    }
                }
            }
        }
    }
}
