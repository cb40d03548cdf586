//! Per-chat bookkeeping of the messages currently showing each view.

use std::collections::HashMap;

use crate::error::FeedError;

pub type ChatId = i64;
pub type MessageId = i64;

/// Favorites view state for one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FavoritesView {
    #[default]
    Closed,
    Open {
        message_id: MessageId,
        position: usize,
    },
}

impl FavoritesView {
    pub fn is_open(&self) -> bool {
        matches!(self, FavoritesView::Open { .. })
    }

    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            FavoritesView::Closed => None,
            FavoritesView::Open { message_id, .. } => Some(*message_id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatViews {
    pub main_message: Option<MessageId>,
    pub favorites: FavoritesView,
}

#[derive(Debug, Default)]
pub struct ViewRegistry {
    chats: HashMap<ChatId, ChatViews>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chat: ChatId) -> ChatViews {
        self.chats.get(&chat).copied().unwrap_or_default()
    }

    pub fn chat_mut(&mut self, chat: ChatId) -> &mut ChatViews {
        self.chats.entry(chat).or_default()
    }

    pub fn chats(&self) -> impl Iterator<Item = ChatId> + '_ {
        self.chats.keys().copied()
    }

    pub fn main_message(&self, chat: ChatId) -> Option<MessageId> {
        self.get(chat).main_message
    }

    pub fn set_main_message(&mut self, chat: ChatId, message_id: MessageId) {
        self.chat_mut(chat).main_message = Some(message_id);
    }

    pub fn forget_main_message(&mut self, chat: ChatId, message_id: MessageId) {
        let views = self.chat_mut(chat);
        if views.main_message == Some(message_id) {
            views.main_message = None;
        }
        self.prune(chat);
    }

    pub fn favorites(&self, chat: ChatId) -> FavoritesView {
        self.get(chat).favorites
    }

    /// Registers a newly rendered favorites message. A second open view in
    /// the same chat is rejected and the existing one is left untouched.
    pub fn open_favorites(
        &mut self,
        chat: ChatId,
        message_id: MessageId,
        position: usize,
    ) -> Result<(), FeedError> {
        let views = self.chat_mut(chat);
        if views.favorites.is_open() {
            return Err(FeedError::AlreadyOpen);
        }
        views.favorites = FavoritesView::Open {
            message_id,
            position,
        };
        Ok(())
    }

    /// Position of the favorites view shown by `message_id`, if that message
    /// is the open one.
    pub fn favorites_position(&self, chat: ChatId, message_id: MessageId) -> Option<usize> {
        match self.favorites(chat) {
            FavoritesView::Open {
                message_id: open,
                position,
            } if open == message_id => Some(position),
            _ => None,
        }
    }

    pub fn set_favorites_position(&mut self, chat: ChatId, position: usize) {
        if let FavoritesView::Open { position: current, .. } = &mut self.chat_mut(chat).favorites {
            *current = position;
        }
    }

    /// Closes the favorites view and returns the message that showed it.
    pub fn close_favorites(&mut self, chat: ChatId) -> Option<MessageId> {
        let closed = std::mem::take(&mut self.chat_mut(chat).favorites).message_id();
        self.prune(chat);
        closed
    }

    fn prune(&mut self, chat: ChatId) {
        if self.chats.get(&chat) == Some(&ChatViews::default()) {
            self.chats.remove(&chat);
        }
    }
}
