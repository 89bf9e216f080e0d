//! Webhook endpoint: parse an update, answer it, acknowledge with 200.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::classifier::{Intent, classify};
use crate::knowledge::KnowledgeBase;
use crate::replies;
use crate::telegram::{ChatTarget, Messenger, OutboundMessage, SendError};

pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct InboundUpdate {
    pub message: Option<InboundMessage>,
    pub edited_message: Option<InboundMessage>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub message: Option<InboundMessage>,
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub chat: InboundChat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InboundChat {
    pub id: ChatTarget,
}

impl InboundUpdate {
    /// The message to answer: new, edited, or the one a button was pressed on.
    pub fn message(&self) -> Option<&InboundMessage> {
        self.message
            .as_ref()
            .or(self.edited_message.as_ref())
            .or(self.callback_query.as_ref().and_then(|q| q.message.as_ref()))
    }

    /// Text to classify. Callback messages never contribute text.
    pub fn text(&self) -> &str {
        [&self.message, &self.edited_message]
            .into_iter()
            .flatten()
            .filter_map(|m| m.text.as_deref())
            .find(|t| !t.is_empty())
            .unwrap_or("")
    }
}

/// Marker returned to Telegram in the acknowledgement body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    NoMessage,
    ErrorLogged,
}

#[derive(Serialize)]
struct Ack {
    status: Status,
}

#[derive(Debug)]
pub enum WebhookError {
    Parse(serde_json::Error),
    Send(SendError),
}

impl fmt::Display for WebhookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookError::Parse(e) => write!(f, "invalid update payload: {e}"),
            WebhookError::Send(e) => write!(f, "send failed: {e}"),
        }
    }
}

impl std::error::Error for WebhookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WebhookError::Parse(e) => Some(e),
            WebhookError::Send(e) => Some(e),
        }
    }
}

impl From<SendError> for WebhookError {
    fn from(e: SendError) -> Self {
        WebhookError::Send(e)
    }
}

pub struct BotState<M> {
    knowledge: KnowledgeBase,
    messenger: M,
}

impl<M: Messenger> BotState<M> {
    pub fn new(knowledge: KnowledgeBase, messenger: M) -> Self {
        Self { knowledge, messenger }
    }

    /// Answers one raw update body. Sends go out one at a time, in order.
    pub async fn handle_update(&self, body: &[u8]) -> Result<Status, WebhookError> {
        let update: InboundUpdate = serde_json::from_slice(body).map_err(WebhookError::Parse)?;

        let Some(message) = update.message() else {
            info!("Update without message, ignoring");
            return Ok(Status::NoMessage);
        };
        let chat = &message.chat.id;
        let text = update.text();

        let intent = classify(text);
        let text_preview: String = text.chars().take(100).collect();
        info!("📨 Chat {chat}: \"{text_preview}\" → {}", intent.as_str());

        if intent == Intent::Start {
            let welcome = OutboundMessage::new(chat.clone(), replies::welcome(&self.knowledge))
                .with_keyboard(replies::main_menu());
            self.deliver(welcome).await?;
            return Ok(Status::Ok);
        }

        let primary = replies::primary(intent, text, &self.knowledge);
        let answer =
            OutboundMessage::new(chat.clone(), primary).with_keyboard(replies::main_menu());
        self.deliver(answer).await?;

        let closing = OutboundMessage::new(chat.clone(), replies::closing_prompt());
        self.deliver(closing).await?;

        if replies::wants_contact(text) {
            let contact = OutboundMessage::new(chat.clone(), replies::contact(&self.knowledge));
            self.deliver(contact).await?;
        }

        Ok(Status::Ok)
    }

    /// Rejections are logged and swallowed; transport failures propagate.
    async fn deliver(&self, message: OutboundMessage) -> Result<(), SendError> {
        match self.messenger.send(&message).await {
            Ok(()) => Ok(()),
            Err(e @ SendError::Rejected(_)) => {
                warn!("Failed to send to chat {}: {e}", message.chat);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

pub fn router<M: Messenger>(state: Arc<BotState<M>>, path: &str) -> Router {
    Router::new()
        .route(path, post(webhook::<M>).fallback(acknowledge))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Telegram only POSTs; any other method is a liveness check and the body is
/// never read.
async fn acknowledge() -> &'static str {
    "OK"
}

async fn webhook<M: Messenger>(State(state): State<Arc<BotState<M>>>, body: Bytes) -> Response {
    let status = match AssertUnwindSafe(state.handle_update(&body)).catch_unwind().await {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            error!("Webhook processing failed: {e}");
            Status::ErrorLogged
        }
        Err(_) => {
            error!("Webhook processing panicked");
            Status::ErrorLogged
        }
    };

    (StatusCode::OK, Json(Ack { status })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> InboundUpdate {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_message_precedence() {
        let update = parse(r#"{
            "edited_message": {"chat": {"id": 2}, "text": "editado"},
            "message": {"chat": {"id": 1}, "text": "nuevo"}
        }"#);
        assert_eq!(update.message().unwrap().chat.id, ChatTarget::Id(1));
        assert_eq!(update.text(), "nuevo");
    }

    #[test]
    fn test_edited_message_used() {
        let update = parse(r#"{"edited_message": {"chat": {"id": 2}, "text": "horarios"}}"#);
        assert_eq!(update.message().unwrap().chat.id, ChatTarget::Id(2));
        assert_eq!(update.text(), "horarios");
    }

    #[test]
    fn test_empty_text_falls_through_to_edit() {
        let update = parse(r#"{
            "message": {"chat": {"id": 1}, "text": ""},
            "edited_message": {"chat": {"id": 1}, "text": "centros"}
        }"#);
        assert_eq!(update.text(), "centros");
    }

    #[test]
    fn test_callback_message_has_no_text() {
        let update = parse(r#"{
            "update_id": 10,
            "callback_query": {"id": "abc", "data": "x", "message": {"chat": {"id": 7}, "text": "Centros"}}
        }"#);
        assert_eq!(update.message().unwrap().chat.id, ChatTarget::Id(7));
        assert_eq!(update.text(), "");
    }

    #[test]
    fn test_no_message() {
        let update = parse(r#"{"update_id": 1, "my_chat_member": {}}"#);
        assert!(update.message().is_none());
        assert_eq!(update.text(), "");

        let update = parse(r#"{"message": null, "callback_query": {"id": "q"}}"#);
        assert!(update.message().is_none());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_value(Status::Ok).unwrap(), "ok");
        assert_eq!(serde_json::to_value(Status::NoMessage).unwrap(), "no_message");
        assert_eq!(serde_json::to_value(Status::ErrorLogged).unwrap(), "error_logged");
    }
}
