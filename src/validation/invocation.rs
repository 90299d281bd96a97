use regex::Regex;
use serenity::all::{ChannelId, GuildId, UserId};
use std::sync::LazyLock;

/// Who sent a command, and where
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    pub author_id: UserId,
    pub author_name: String,
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
}

/// Snapshot of one command invocation, taken before any validation or side effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub author_id: UserId,
    pub author_name: String,
    /// `None` for direct messages
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    /// Command name without the prefix
    pub command: String,
    /// Positional arguments following the command name
    pub args: Vec<String>,
    /// Channels mentioned anywhere in the message, e.g. `<#1234567890>`, in order of appearance
    pub mentioned_channels: Vec<ChannelId>,
}

impl Invocation {
    /// Interpret message content as a bot command, e.g. `;voice_channel "Voice Lounge"`.
    ///
    /// `None` if the content does not start with `prefix` immediately followed by a command name.
    pub fn parse(prefix: &str, content: &str, origin: Origin) -> Option<Self> {
        let rest = content.strip_prefix(prefix)?;
        if rest.starts_with(char::is_whitespace) {
            return None;
        }

        let mut terms = split_args(rest).into_iter();
        let command = terms.next().filter(|command| !command.is_empty())?;

        Some(Self {
            author_id: origin.author_id,
            author_name: origin.author_name,
            guild_id: origin.guild_id,
            channel_id: origin.channel_id,
            command,
            args: terms.collect(),
            mentioned_channels: channel_mentions(content),
        })
    }

    pub fn is(&self, command: &str) -> bool {
        self.command == command
    }
}

/// Split on whitespace, keeping double-quoted runs together.
fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut in_term = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_term = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_term {
                    args.push(std::mem::take(&mut current));
                    in_term = false;
                }
            }
            c => {
                current.push(c);
                in_term = true;
            }
        }
    }
    if in_term {
        args.push(current);
    }

    args
}

fn channel_mentions(content: &str) -> Vec<ChannelId> {
    static CHANNEL_MENTION: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<#(\d+)>").expect("valid channel mention pattern"));

    let mut mentions = Vec::new();
    for capture in CHANNEL_MENTION.captures_iter(content) {
        let Ok(id) = capture[1].parse::<u64>() else {
            continue;
        };
        if id == 0 {
            continue;
        }
        let id = ChannelId::new(id);
        if !mentions.contains(&id) {
            mentions.push(id);
        }
    }
    mentions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin {
            author_id: UserId::new(7),
            author_name: "paradigm".to_owned(),
            guild_id: Some(GuildId::new(42)),
            channel_id: ChannelId::new(100),
        }
    }

    #[test]
    fn parses_command_and_arguments() {
        let inv = Invocation::parse(";", ";play intro.mp3 loud", origin()).unwrap();
        assert_eq!(inv.command, "play");
        assert_eq!(inv.args, vec!["intro.mp3", "loud"]);
        assert!(inv.is("play"));
        assert_eq!(inv.guild_id, Some(GuildId::new(42)));
    }

    #[test]
    fn quoted_arguments_stay_together() {
        let inv = Invocation::parse(";", r#";voice_channel "Voice Lounge""#, origin()).unwrap();
        assert_eq!(inv.args, vec!["Voice Lounge"]);

        let inv = Invocation::parse(";", r#";x "" b"#, origin()).unwrap();
        assert_eq!(inv.args, vec!["", "b"]);
    }

    #[test]
    fn ignores_messages_without_the_prefix() {
        assert!(Invocation::parse(";", "play intro.mp3", origin()).is_none());
        assert!(Invocation::parse(";", "; play", origin()).is_none());
        assert!(Invocation::parse(";", ";", origin()).is_none());
    }

    #[test]
    fn collects_unique_channel_mentions() {
        let inv = Invocation::parse(";", ";channel <#55> <#56> <#55> <#0>", origin()).unwrap();
        assert_eq!(
            inv.mentioned_channels,
            vec![ChannelId::new(55), ChannelId::new(56)]
        );
        assert_eq!(inv.args.len(), 4);
    }
}
