//! Renders feed views as Telegram photo messages with inline keyboards.

use async_trait::async_trait;
use memefeed_core::presentation::{ActionMenu, RenderedView};
use memefeed_core::transport::{EventOrigin, Notice, Transport, TransportError};
use memefeed_core::views::{ChatId, MessageId};

use crate::telegram::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputMediaPhoto, TelegramClient, TelegramError,
};

const NOT_MODIFIED: &str = "message is not modified";
const GONE_MARKERS: &[&str] = &[
    "message to edit not found",
    "message to delete not found",
    "message can't be deleted",
    "MESSAGE_ID_INVALID",
];

pub struct TelegramTransport {
    client: TelegramClient,
}

impl TelegramTransport {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &TelegramClient {
        &self.client
    }
}

pub fn keyboard(menu: &ActionMenu) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: menu
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| InlineKeyboardButton {
                        text: button.label.to_string(),
                        callback_data: button.action.to_string(),
                    })
                    .collect()
            })
            .collect(),
    }
}

/// Maps an API failure on `message_id` to the transport error taxonomy.
/// An edit that changes nothing counts as success.
fn classify(message_id: MessageId, result: Result<(), TelegramError>) -> Result<(), TransportError> {
    let Err(err) = result else {
        return Ok(());
    };
    match err.description() {
        Some(description) if description.contains(NOT_MODIFIED) => Ok(()),
        Some(description) if GONE_MARKERS.iter().any(|marker| description.contains(marker)) => {
            Err(TransportError::MessageGone(message_id))
        }
        Some(description) => Err(TransportError::Rejected(description.to_string())),
        None => Err(TransportError::Network(err.to_string())),
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn render_new(
        &self,
        chat: ChatId,
        view: &RenderedView,
    ) -> Result<MessageId, TransportError> {
        self.client
            .send_photo(chat, &view.media_url, &view.caption, &keyboard(&view.menu))
            .await
            .map(|message| message.message_id)
            .map_err(|err| match err.description() {
                Some(description) => TransportError::Rejected(description.to_string()),
                None => TransportError::Network(err.to_string()),
            })
    }

    async fn render_edit(
        &self,
        chat: ChatId,
        message_id: MessageId,
        view: &RenderedView,
    ) -> Result<(), TransportError> {
        let media = InputMediaPhoto::html(&view.media_url, &view.caption);
        let result = self
            .client
            .edit_message_media(chat, message_id, media, &keyboard(&view.menu))
            .await;
        classify(message_id, result)
    }

    async fn render_menu_edit(
        &self,
        chat: ChatId,
        message_id: MessageId,
        menu: &ActionMenu,
    ) -> Result<(), TransportError> {
        let result = self
            .client
            .edit_message_reply_markup(chat, message_id, &keyboard(menu))
            .await;
        classify(message_id, result)
    }

    async fn delete(&self, chat: ChatId, message_id: MessageId) -> Result<(), TransportError> {
        let result = self.client.delete_message(chat, message_id).await;
        classify(message_id, result)
    }

    async fn notify(&self, origin: &EventOrigin, notice: Option<&Notice>) {
        let result = match (&origin.callback_id, notice) {
            (Some(callback_id), notice) => {
                self.client
                    .answer_callback_query(
                        callback_id,
                        notice.map(|notice| notice.text.as_str()),
                        notice.is_some_and(|notice| notice.urgent),
                    )
                    .await
            }
            (None, Some(notice)) => self
                .client
                .send_message(origin.chat, &notice.text)
                .await
                .map(|_| ()),
            (None, None) => Ok(()),
        };
        if let Err(err) = result {
            tracing::warn!(chat = origin.chat, error = %err, "failed to deliver notice");
        }
    }
}

#[cfg(test)]
mod tests {
    use memefeed_core::action::Action;
    use memefeed_core::presentation::favorites_menu;

    use super::*;

    fn api_error(description: &str) -> Result<(), TelegramError> {
        Err(TelegramError::Api {
            description: description.to_string(),
            error_code: Some(400),
        })
    }

    #[test]
    fn unchanged_edits_are_success() {
        let result = classify(
            5,
            api_error("Bad Request: message is not modified: specified new message content"),
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn missing_messages_are_gone() {
        assert_eq!(
            classify(5, api_error("Bad Request: message to edit not found")),
            Err(TransportError::MessageGone(5))
        );
        assert_eq!(
            classify(6, api_error("Bad Request: message to delete not found")),
            Err(TransportError::MessageGone(6))
        );
    }

    #[test]
    fn other_api_errors_are_rejections() {
        assert_eq!(
            classify(5, api_error("Bad Request: wrong file identifier")),
            Err(TransportError::Rejected(
                "Bad Request: wrong file identifier".to_string()
            ))
        );
    }

    #[test]
    fn keyboard_encodes_actions_as_callback_data() {
        let markup = keyboard(&favorites_menu(1, 3));
        let data: Vec<Vec<&str>> = markup
            .inline_keyboard
            .iter()
            .map(|row| row.iter().map(|b| b.callback_data.as_str()).collect())
            .collect();
        assert_eq!(data, [vec!["fb:1", "ff:1"], vec!["fd:1", "fc"]]);
        assert_eq!(Action::FavoritesDelete(1).to_string(), "fd:1");
    }
}
