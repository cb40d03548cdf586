//! Turns Telegram updates into feed events.

use std::collections::HashSet;

use memefeed_core::UserEvent;
use memefeed_core::action::Action;
use memefeed_core::transport::EventOrigin;
use memefeed_core::views::ChatId;

use crate::commands::{BotCommand, parse_command};
use crate::telegram::{CallbackQuery, Message, Update};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Incoming {
    pub origin: EventOrigin,
    pub input: Input,
}

impl Incoming {
    pub(crate) fn chat(&self) -> ChatId {
        self.origin.chat
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Input {
    Event(UserEvent),
    Help,
    /// A button press that must be acknowledged but carries nothing usable.
    Acknowledge,
}

/// Users allowed to drive the bot. Empty allows everyone.
pub(crate) struct Allowlist<'a>(pub &'a HashSet<i64>);

impl Allowlist<'_> {
    fn permits(&self, user_id: i64) -> bool {
        self.0.is_empty() || self.0.contains(&user_id)
    }
}

pub(crate) fn parse_update(update: Update, allowlist: &Allowlist<'_>) -> Option<Incoming> {
    if let Some(query) = update.callback_query {
        return parse_callback(query, allowlist);
    }
    update
        .message
        .and_then(|message| parse_message(message, allowlist))
}

fn parse_message(message: Message, allowlist: &Allowlist<'_>) -> Option<Incoming> {
    let user = message.from.as_ref()?;
    if user.is_bot {
        return None;
    }
    if !allowlist.permits(user.id) {
        tracing::debug!(user = user.id, chat = message.chat.id, "denied user");
        return None;
    }

    let command = parse_command(message.text.as_deref()?)?;
    let input = match command {
        BotCommand::Start => Input::Event(UserEvent::StartSession),
        BotCommand::Favorites => Input::Event(UserEvent::Action(Action::ShowFavorites)),
        BotCommand::Clear => Input::Event(UserEvent::ClearFavorites),
        BotCommand::Help => Input::Help,
    };
    Some(Incoming {
        origin: EventOrigin::command(message.chat.id),
        input,
    })
}

fn parse_callback(query: CallbackQuery, allowlist: &Allowlist<'_>) -> Option<Incoming> {
    let Some(message) = query.message.as_ref() else {
        // Too old for Telegram to include the message; only the spinner can be cleared.
        tracing::debug!(user = query.from.id, "callback without message");
        return Some(Incoming {
            origin: EventOrigin {
                chat: query.from.id,
                message_id: None,
                callback_id: Some(query.id),
            },
            input: Input::Acknowledge,
        });
    };
    let origin = EventOrigin::button(message.chat.id, message.message_id, query.id.clone());

    if !allowlist.permits(query.from.id) {
        tracing::debug!(user = query.from.id, chat = origin.chat, "denied user");
        return Some(Incoming {
            origin,
            input: Input::Acknowledge,
        });
    }

    let input = match query.data.as_deref().map(str::parse::<Action>) {
        Some(Ok(action)) => Input::Event(UserEvent::Action(action)),
        Some(Err(err)) => {
            tracing::warn!(chat = origin.chat, error = %err, "ignoring button");
            Input::Acknowledge
        }
        None => Input::Acknowledge,
    };
    Some(Incoming { origin, input })
}
