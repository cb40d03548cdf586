//! All mutable bot state: feeds keyed by session scope plus the view registry.

use std::collections::HashMap;

use crate::config::SessionScope;
use crate::favorites::Favorites;
use crate::session::BrowsingSession;
use crate::views::{ChatId, ViewRegistry};

/// Browsing session and favorites that belong together.
#[derive(Debug, Default)]
pub struct Feed {
    pub session: BrowsingSession,
    pub favorites: Favorites,
}

#[derive(Debug)]
pub struct FeedBook {
    scope: SessionScope,
    feeds: HashMap<Option<ChatId>, Feed>,
    views: ViewRegistry,
}

impl FeedBook {
    pub fn new(scope: SessionScope) -> Self {
        Self {
            scope,
            feeds: HashMap::new(),
            views: ViewRegistry::new(),
        }
    }

    pub fn scope(&self) -> SessionScope {
        self.scope
    }

    fn key(&self, chat: ChatId) -> Option<ChatId> {
        match self.scope {
            SessionScope::Shared => None,
            SessionScope::PerChat => Some(chat),
        }
    }

    /// Feed serving `chat`, created on first use.
    pub fn feed_mut(&mut self, chat: ChatId) -> &mut Feed {
        let key = self.key(chat);
        self.feeds.entry(key).or_default()
    }

    pub fn feed(&self, chat: ChatId) -> Option<&Feed> {
        self.feeds.get(&self.key(chat))
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut ViewRegistry {
        &mut self.views
    }

    /// Feed and registry borrowed together for synchronization.
    pub fn split_mut(&mut self, chat: ChatId) -> (&mut Feed, &mut ViewRegistry) {
        let key = self.key(chat);
        (self.feeds.entry(key).or_default(), &mut self.views)
    }

    /// Chats whose views show `chat`'s feed, `chat` first.
    pub fn chats_sharing(&self, chat: ChatId) -> Vec<ChatId> {
        let mut chats = vec![chat];
        if self.scope == SessionScope::Shared {
            let mut others: Vec<ChatId> = self.views.chats().filter(|&id| id != chat).collect();
            others.sort_unstable();
            chats.extend(others);
        }
        chats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;

    fn item(id: &str) -> Item {
        Item::new(id, "https://i.redd.it/x.png", id, 1, "r/memes", "", 250)
    }

    #[test]
    fn per_chat_scope_isolates_sessions() {
        let mut book = FeedBook::new(SessionScope::PerChat);
        book.feed_mut(1).session.append_and_focus(item("a"));
        assert_eq!(book.feed(1).unwrap().session.len(), 1);
        assert!(book.feed(2).is_none());
        book.views_mut().set_main_message(2, 9);
        assert_eq!(book.chats_sharing(1), [1]);
    }

    #[test]
    fn shared_scope_uses_one_session() {
        let mut book = FeedBook::new(SessionScope::Shared);
        book.feed_mut(1).session.append_and_focus(item("a"));
        book.feed_mut(2).session.append_and_focus(item("b"));
        assert_eq!(book.feed(3).unwrap().session.len(), 2);
    }

    #[test]
    fn shared_scope_lists_every_chat_with_views() {
        let mut book = FeedBook::new(SessionScope::Shared);
        book.views_mut().set_main_message(3, 30);
        book.views_mut().set_main_message(2, 20);
        assert_eq!(book.chats_sharing(1), [1, 2, 3]);
        assert_eq!(book.chats_sharing(2), [2, 3]);
    }
}
