use crate::{event::*, plugin::*, reply::Reply};
use anyhow::Result;

pub struct Help;

#[serenity::async_trait]
impl Plugin for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        Some(format!("`{}{}` - show this help message", ctx.prefix().await, self.name()))
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some(inv) = event.is_bot_cmd(self.name()) else {
            return Ok(EventHandled::No);
        };

        let mut body = String::new();
        for plugin in crate::plugin::plugins() {
            if let Some(usage) = plugin.usage(ctx).await {
                body.push_str(&usage);
                body.push('\n');
            }
        }

        let reply = Reply::info("Commands", body, self.name());
        ctx.platform.send_message(inv.channel_id, &reply).await?;
        Ok(EventHandled::Yes)
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{TestBot, MEMBER_ID};

    #[tokio::test]
    async fn lists_every_command() {
        let bot = TestBot::new();
        let replies = bot.command(MEMBER_ID, ";help").await;

        assert_eq!(replies.len(), 1);
        let body = &replies[0].body;
        for command in ["help", "channel", "voice_channel", "join", "play", "clear", "off"] {
            assert!(body.contains(&format!("`;{}", command)), "missing {}", command);
        }
        assert!(!replies[0].is_error);
    }

    #[tokio::test]
    async fn works_in_direct_messages() {
        let bot = TestBot::new();
        assert_eq!(bot.dm_command(MEMBER_ID, ";help").await.len(), 1);
    }
}
