//! Outbound Telegram messages.

use std::fmt;
use std::future::Future;

use serde::Deserialize;
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, ParseMode, Recipient};
use tracing::info;

/// Destination chat as it arrives in an update: a numeric id, or a
/// `@channelusername` string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChatTarget {
    Id(i64),
    Username(String),
}

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatTarget::Id(id) => write!(f, "{id}"),
            ChatTarget::Username(name) => write!(f, "{name}"),
        }
    }
}

impl From<&ChatTarget> for Recipient {
    fn from(target: &ChatTarget) -> Self {
        match target {
            ChatTarget::Id(id) => Recipient::Id(ChatId(*id)),
            ChatTarget::Username(name) => Recipient::ChannelUsername(name.clone()),
        }
    }
}

/// Quick-reply buttons shown under the input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
    pub resize: bool,
    pub one_time: bool,
}

impl ReplyKeyboard {
    fn to_markup(&self) -> KeyboardMarkup {
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().map(KeyboardButton::new).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let mut markup = KeyboardMarkup::new(rows);
        if self.resize {
            markup = markup.resize_keyboard();
        }
        if self.one_time {
            markup = markup.one_time_keyboard();
        }
        markup
    }
}

/// One `sendMessage` call. Text uses legacy Markdown (`*bold*`, `_italic_`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat: ChatTarget,
    pub text: String,
    pub keyboard: Option<ReplyKeyboard>,
}

impl OutboundMessage {
    pub fn new(chat: ChatTarget, text: impl Into<String>) -> Self {
        Self {
            chat,
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: ReplyKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// Telegram answered, but not with success.
    Rejected(String),
    /// The request did not get an answer at all.
    Transport(String),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Rejected(e) => write!(f, "rejected by Telegram: {e}"),
            SendError::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}

impl std::error::Error for SendError {}

impl From<RequestError> for SendError {
    fn from(e: RequestError) -> Self {
        match &e {
            RequestError::Api(_)
            | RequestError::MigrateToChatId(..)
            | RequestError::RetryAfter(..) => SendError::Rejected(e.to_string()),
            // Non-JSON answer, e.g. an HTML error page from a proxy.
            RequestError::InvalidJson { raw, .. } => {
                SendError::Rejected(format!("unparseable response: {raw}"))
            }
            _ => SendError::Transport(e.to_string()),
        }
    }
}

/// Something that can deliver an [`OutboundMessage`].
pub trait Messenger: Send + Sync + 'static {
    fn send(&self, message: &OutboundMessage) -> impl Future<Output = Result<(), SendError>> + Send;
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(token: &str, api_url: reqwest::Url) -> Self {
        Self {
            bot: Bot::new(token).set_api_url(api_url),
        }
    }
}

impl Messenger for TelegramClient {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError> {
        #[allow(deprecated)]
        let mut request = self
            .bot
            .send_message(Recipient::from(&message.chat), message.text.as_str())
            .parse_mode(ParseMode::Markdown);

        if let Some(keyboard) = &message.keyboard {
            request = request.reply_markup(keyboard.to_markup());
        }

        let sent = request.await?;
        info!("📤 Sent message {} to chat {}", sent.id.0, message.chat);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_target_from_json() {
        let id: ChatTarget = serde_json::from_str("123456").unwrap();
        assert_eq!(id, ChatTarget::Id(123456));
        let negative: ChatTarget = serde_json::from_str("-100200300").unwrap();
        assert_eq!(negative, ChatTarget::Id(-100200300));
        let name: ChatTarget = serde_json::from_str(r#""@misiones""#).unwrap();
        assert_eq!(name, ChatTarget::Username("@misiones".to_string()));
    }

    #[test]
    fn test_keyboard_markup_flags() {
        let keyboard = ReplyKeyboard {
            rows: vec![vec!["A".to_string(), "B".to_string()], vec!["C".to_string()]],
            resize: true,
            one_time: false,
        };
        let json = serde_json::to_value(keyboard.to_markup()).unwrap();
        assert_eq!(json["keyboard"].as_array().unwrap().len(), 2);
        assert_eq!(json["keyboard"][0][1]["text"], "B");
        assert_eq!(json["resize_keyboard"], true);
        assert_ne!(json["one_time_keyboard"], true);
    }

    #[test]
    fn test_outbound_message_builder() {
        let msg = OutboundMessage::new(ChatTarget::Id(1), "hola");
        assert!(msg.keyboard.is_none());
        let keyboard = ReplyKeyboard {
            rows: vec![],
            resize: true,
            one_time: false,
        };
        let msg = msg.with_keyboard(keyboard.clone());
        assert_eq!(msg.keyboard, Some(keyboard));
    }

    #[test]
    fn test_api_error_is_rejection() {
        let err = SendError::from(RequestError::Api(teloxide::ApiError::BotBlocked));
        assert!(matches!(err, SendError::Rejected(_)));
    }

    #[test]
    fn test_unparseable_response_is_rejection() {
        let source = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let err = SendError::from(RequestError::InvalidJson {
            source: source.into(),
            raw: "<html><body>502 Bad Gateway</body></html>".into(),
        });
        match err {
            SendError::Rejected(body) => assert!(body.contains("502 Bad Gateway")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
