//! Messaging transport boundary.

use async_trait::async_trait;
use thiserror::Error;

use crate::presentation::{ActionMenu, RenderedView};
use crate::views::{ChatId, MessageId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The target message no longer exists (deleted by the user or expired).
    #[error("message {0} no longer exists")]
    MessageGone(MessageId),
    #[error("transport rejected the request: {0}")]
    Rejected(String),
    #[error("transport unreachable: {0}")]
    Network(String),
}

/// Where a user event came from; notices are answered against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOrigin {
    pub chat: ChatId,
    /// Message whose button was pressed; `None` for typed commands.
    pub message_id: Option<MessageId>,
    /// Transport handle for acknowledging a button press.
    pub callback_id: Option<String>,
}

impl EventOrigin {
    pub fn command(chat: ChatId) -> Self {
        Self {
            chat,
            message_id: None,
            callback_id: None,
        }
    }

    pub fn button(chat: ChatId, message_id: MessageId, callback_id: impl Into<String>) -> Self {
        Self {
            chat,
            message_id: Some(message_id),
            callback_id: Some(callback_id.into()),
        }
    }
}

/// Short feedback for the user that triggered an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    /// Shown as a blocking alert rather than a transient toast.
    pub urgent: bool,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            urgent: false,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn render_new(
        &self,
        chat: ChatId,
        view: &RenderedView,
    ) -> Result<MessageId, TransportError>;

    async fn render_edit(
        &self,
        chat: ChatId,
        message_id: MessageId,
        view: &RenderedView,
    ) -> Result<(), TransportError>;

    async fn render_menu_edit(
        &self,
        chat: ChatId,
        message_id: MessageId,
        menu: &ActionMenu,
    ) -> Result<(), TransportError>;

    async fn delete(&self, chat: ChatId, message_id: MessageId) -> Result<(), TransportError>;

    /// Answers the event. Called exactly once per event, with `None` when
    /// there is nothing to say (button presses still need acknowledging).
    async fn notify(&self, origin: &EventOrigin, notice: Option<&Notice>);
}
