use serenity::all::{ChannelId, GuildId};

/// Per-guild settings as persisted.  Channel ids of `0` mean "not configured".
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GuildSettings {
    #[serde(rename = "Guild ID")]
    pub guild_id: u64,
    #[serde(rename = "Main channel ID")]
    pub main_channel_id: u64,
    #[serde(rename = "Voice channel ID")]
    pub voice_channel_id: u64,
}

impl GuildSettings {
    /// Settings for a guild seen for the first time
    pub fn default_for(guild_id: GuildId) -> Self {
        Self {
            guild_id: guild_id.get(),
            main_channel_id: 0,
            voice_channel_id: 0,
        }
    }

    pub fn main_channel(&self) -> Option<ChannelId> {
        non_zero(self.main_channel_id)
    }

    pub fn voice_channel(&self) -> Option<ChannelId> {
        non_zero(self.voice_channel_id)
    }
}

fn non_zero(id: u64) -> Option<ChannelId> {
    (id != 0).then(|| ChannelId::new(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_a_flat_document() {
        let settings = GuildSettings {
            guild_id: 42,
            main_channel_id: 100,
            voice_channel_id: 0,
        };
        let json = serde_json::to_value(settings).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Guild ID": 42,
                "Main channel ID": 100,
                "Voice channel ID": 0,
            })
        );
    }

    #[test]
    fn zero_means_unset() {
        let settings = GuildSettings::default_for(GuildId::new(42));
        assert_eq!(settings.guild_id, 42);
        assert_eq!(settings.main_channel(), None);
        assert_eq!(settings.voice_channel(), None);

        let settings = GuildSettings {
            main_channel_id: 100,
            ..settings
        };
        assert_eq!(settings.main_channel(), Some(ChannelId::new(100)));
    }
}
