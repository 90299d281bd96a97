//! Embed-style replies sent back to the channel a command came from

use serenity::all::{Colour, CreateEmbed, CreateEmbedFooter, CreateMessage};

/// Discord rejects embeds whose combined text exceeds this many characters.
const EMBED_MAX_CHARS: usize = 4096;

const INFO_PREFIX: &str = "\u{2771}\u{2771}\u{2771}"; // ❱❱❱
const ERROR_PREFIX: &str = "\u{274C}"; // ❌

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub title: String,
    pub body: String,
    pub footer: String,
    pub is_error: bool,
    pub url: Option<String>,
}

impl Reply {
    pub fn info(
        title: impl Into<String>,
        body: impl Into<String>,
        footer: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            footer: footer.into(),
            is_error: false,
            url: None,
        }
    }

    pub fn error(body: impl Into<String>, footer: impl Into<String>) -> Self {
        Self {
            title: "Error".to_owned(),
            body: body.into(),
            footer: footer.into(),
            is_error: true,
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn heading(&self) -> String {
        let prefix = if self.is_error { ERROR_PREFIX } else { INFO_PREFIX };
        format!("{} **{}**", prefix, self.title)
    }

    /// Combined length of the embed's text fields, as Discord counts it.
    pub fn char_count(&self) -> usize {
        self.heading().chars().count() + self.body.chars().count() + self.footer.chars().count()
    }

    /// Replace an oversized reply with an error, since Discord would refuse to deliver it.
    pub fn fit(self) -> Self {
        if self.char_count() <= EMBED_MAX_CHARS {
            self
        } else {
            Reply::error("The generated message is too large", self.footer)
        }
    }

    pub fn to_embed(&self) -> CreateEmbed {
        let colour = if self.is_error {
            Colour::RED
        } else {
            Colour::DARK_PURPLE
        };

        let embed = CreateEmbed::new()
            .title(self.heading())
            .description(&self.body)
            .colour(colour)
            .footer(CreateEmbedFooter::new(&self.footer));

        match &self.url {
            Some(url) => embed.url(url),
            None => embed,
        }
    }

    pub fn to_message(&self) -> CreateMessage {
        CreateMessage::new().embed(self.to_embed())
    }
}
