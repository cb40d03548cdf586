//! Minimal Telegram Bot API client.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod types;

pub use types::{
    CallbackQuery, Chat, InlineKeyboardButton, InlineKeyboardMarkup, InputMediaPhoto, Message,
    Update, User,
};

use crate::commands::TelegramCommandSpec;

pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
const TELEGRAM_PARSE_MODE: &str = "HTML";

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram API error: {description}")]
    Api {
        description: String,
        error_code: Option<i64>,
    },
}

impl TelegramError {
    /// API error description, if the API answered at all.
    pub fn description(&self) -> Option<&str> {
        match self {
            TelegramError::Api { description, .. } => Some(description),
            TelegramError::Http(_) => None,
        }
    }
}

pub type Result<T, E = TelegramError> = std::result::Result<T, E>;

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Client against a different API host (used by tests).
    pub fn with_base_url(token: String, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    pub async fn get_updates(&self, offset: Option<i64>, timeout: Duration) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: Some(vec!["message", "callback_query"]),
        };
        self.post("getUpdates", &request).await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: TELEGRAM_PARSE_MODE,
        };
        self.post("sendMessage", &request).await
    }

    pub async fn send_photo(
        &self,
        chat_id: i64,
        photo: &str,
        caption: &str,
        reply_markup: &InlineKeyboardMarkup,
    ) -> Result<Message> {
        let request = SendPhotoRequest {
            chat_id,
            photo,
            caption,
            parse_mode: TELEGRAM_PARSE_MODE,
            reply_markup,
        };
        self.post("sendPhoto", &request).await
    }

    pub async fn edit_message_media(
        &self,
        chat_id: i64,
        message_id: i64,
        media: InputMediaPhoto<'_>,
        reply_markup: &InlineKeyboardMarkup,
    ) -> Result<()> {
        let request = EditMessageMediaRequest {
            chat_id,
            message_id,
            media,
            reply_markup,
        };
        let _: serde_json::Value = self.post("editMessageMedia", &request).await?;
        Ok(())
    }

    pub async fn edit_message_reply_markup(
        &self,
        chat_id: i64,
        message_id: i64,
        reply_markup: &InlineKeyboardMarkup,
    ) -> Result<()> {
        let request = EditMessageReplyMarkupRequest {
            chat_id,
            message_id,
            reply_markup,
        };
        let _: serde_json::Value = self.post("editMessageReplyMarkup", &request).await?;
        Ok(())
    }

    pub async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let request = DeleteMessageRequest {
            chat_id,
            message_id,
        };
        let _: bool = self.post("deleteMessage", &request).await?;
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()> {
        let request = AnswerCallbackQueryRequest {
            callback_query_id,
            text,
            show_alert,
        };
        let _: bool = self.post("answerCallbackQuery", &request).await?;
        Ok(())
    }

    pub async fn set_my_commands(&self, commands: &[TelegramCommandSpec]) -> Result<()> {
        let request = SetMyCommandsRequest { commands };
        let _: bool = self.post("setMyCommands", &request).await?;
        Ok(())
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, method: &str, body: &B) -> Result<T> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let payload: TelegramResponse<T> = self
            .http
            .post(url)
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        match payload.result {
            Some(result) if payload.ok => Ok(result),
            _ => Err(TelegramError::Api {
                description: payload
                    .description
                    .unwrap_or_else(|| "Telegram API error".to_string()),
                error_code: payload.error_code,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_updates: Option<Vec<&'static str>>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Serialize)]
struct SendPhotoRequest<'a> {
    chat_id: i64,
    photo: &'a str,
    caption: &'a str,
    parse_mode: &'a str,
    reply_markup: &'a InlineKeyboardMarkup,
}

#[derive(Debug, Serialize)]
struct EditMessageMediaRequest<'a> {
    chat_id: i64,
    message_id: i64,
    media: InputMediaPhoto<'a>,
    reply_markup: &'a InlineKeyboardMarkup,
}

#[derive(Debug, Serialize)]
struct EditMessageReplyMarkupRequest<'a> {
    chat_id: i64,
    message_id: i64,
    reply_markup: &'a InlineKeyboardMarkup,
}

#[derive(Debug, Serialize)]
struct DeleteMessageRequest {
    chat_id: i64,
    message_id: i64,
}

#[derive(Debug, Serialize)]
struct AnswerCallbackQueryRequest<'a> {
    callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    show_alert: bool,
}

#[derive(Debug, Serialize)]
struct SetMyCommandsRequest<'a> {
    commands: &'a [TelegramCommandSpec],
}
