use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{debug, error, warn};

use crate::config::Config;

/// Destination for human-readable status messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat: Recipient,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, chat: Recipient) -> Self {
        Self { bot, chat }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let bot = Bot::new(cfg.credentials.telegram_token.clone());
        Self::new(bot, parse_recipient(&cfg.credentials.telegram_chat_id))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        self.bot.send_message(self.chat.clone(), text).await?;
        Ok(())
    }
}

/// Numeric ids address a chat directly; anything else is a channel username,
/// which Telegram only accepts with a leading `@`.
pub fn parse_recipient(raw: &str) -> Recipient {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if raw.starts_with('@') => Recipient::ChannelUsername(raw.to_string()),
        Err(_) => {
            warn!(chat = raw, "chat id is not numeric and lacks '@'; assuming channel username");
            Recipient::ChannelUsername(format!("@{raw}"))
        }
    }
}

/// Deliver `text`, logging and swallowing any failure. Returns whether it was sent.
pub async fn send_message(notifier: &dyn Notifier, text: &str) -> bool {
    match notifier.send(text).await {
        Ok(()) => {
            debug!(%text, "message sent to Telegram");
            true
        }
        Err(err) => {
            error!(?err, "failed to send message to Telegram");
            false
        }
    }
}
