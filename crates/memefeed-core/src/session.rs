//! Browsing session: an append-only viewed history plus a cursor.

use std::collections::HashSet;
use std::fmt;

use crate::error::FeedError;
use crate::item::{Item, ItemId};

/// Which end of the history a navigation step ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Oldest,
    Newest,
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boundary::Oldest => f.write_str("oldest"),
            Boundary::Newest => f.write_str("newest"),
        }
    }
}

/// Main-view state. `Viewing` always holds a valid history index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    NoItem,
    Viewing(usize),
}

#[derive(Debug, Default)]
pub struct BrowsingSession {
    history: Vec<Item>,
    seen: HashSet<ItemId>,
    cursor: Cursor,
}

impl BrowsingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `item` and focuses it.
    ///
    /// An item whose identity is already in the history is not appended
    /// again; the cursor moves to its existing position instead.
    pub fn append_and_focus(&mut self, item: Item) -> &Item {
        let index = if self.seen.contains(item.id()) {
            self.position_of(item.id()).unwrap_or(self.history.len() - 1)
        } else {
            self.seen.insert(item.id().clone());
            self.history.push(item);
            self.history.len() - 1
        };
        self.cursor = Cursor::Viewing(index);
        &self.history[index]
    }

    pub fn step_back(&mut self) -> Result<&Item, FeedError> {
        match self.cursor {
            Cursor::NoItem => Err(FeedError::NoSession),
            Cursor::Viewing(0) => Err(FeedError::BoundaryReached(Boundary::Oldest)),
            Cursor::Viewing(index) => {
                self.cursor = Cursor::Viewing(index - 1);
                Ok(&self.history[index - 1])
            }
        }
    }

    pub fn step_forward(&mut self) -> Result<&Item, FeedError> {
        match self.cursor {
            Cursor::NoItem => Err(FeedError::NoSession),
            Cursor::Viewing(index) if index + 1 >= self.history.len() => {
                Err(FeedError::BoundaryReached(Boundary::Newest))
            }
            Cursor::Viewing(index) => {
                self.cursor = Cursor::Viewing(index + 1);
                Ok(&self.history[index + 1])
            }
        }
    }

    pub fn current(&self) -> Option<&Item> {
        match self.cursor {
            Cursor::NoItem => None,
            Cursor::Viewing(index) => self.history.get(index),
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn has_older(&self) -> bool {
        matches!(self.cursor, Cursor::Viewing(index) if index > 0)
    }

    pub fn has_newer(&self) -> bool {
        matches!(self.cursor, Cursor::Viewing(index) if index + 1 < self.history.len())
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.seen.contains(id)
    }

    pub fn seen(&self) -> &HashSet<ItemId> {
        &self.seen
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    fn position_of(&self, id: &ItemId) -> Option<usize> {
        self.history.iter().position(|item| item.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> Item {
        Item::new(id, format!("https://i.redd.it/{id}.png"), id, 6000, "r/memes", "", 250)
    }

    #[test]
    fn empty_session_has_no_item() {
        let mut session = BrowsingSession::new();
        assert_eq!(session.cursor(), Cursor::NoItem);
        assert!(session.current().is_none());
        assert_eq!(session.step_back().unwrap_err(), FeedError::NoSession);
        assert_eq!(session.step_forward().unwrap_err(), FeedError::NoSession);
    }

    #[test]
    fn append_moves_cursor_to_newest() {
        let mut session = BrowsingSession::new();
        session.append_and_focus(item("a"));
        session.append_and_focus(item("b"));
        assert_eq!(session.cursor(), Cursor::Viewing(1));
        assert_eq!(session.current().unwrap().id().as_str(), "b");
    }

    #[test]
    fn back_then_forward_restores_position() {
        let mut session = BrowsingSession::new();
        for id in ["a", "b", "c"] {
            session.append_and_focus(item(id));
        }
        let before = session.cursor();
        assert_eq!(session.step_back().unwrap().id().as_str(), "b");
        assert_eq!(session.step_forward().unwrap().id().as_str(), "c");
        assert_eq!(session.cursor(), before);
    }

    #[test]
    fn boundaries_do_not_move_cursor() {
        let mut session = BrowsingSession::new();
        session.append_and_focus(item("a"));
        assert_eq!(
            session.step_back().unwrap_err(),
            FeedError::BoundaryReached(Boundary::Oldest)
        );
        assert_eq!(
            session.step_forward().unwrap_err(),
            FeedError::BoundaryReached(Boundary::Newest)
        );
        assert_eq!(session.cursor(), Cursor::Viewing(0));
    }

    #[test]
    fn duplicate_identity_is_focused_not_appended() {
        let mut session = BrowsingSession::new();
        session.append_and_focus(item("a"));
        session.append_and_focus(item("b"));
        session.append_and_focus(item("a"));
        assert_eq!(session.len(), 2);
        assert_eq!(session.cursor(), Cursor::Viewing(0));
    }

    #[test]
    fn neighbour_flags_follow_cursor() {
        let mut session = BrowsingSession::new();
        session.append_and_focus(item("a"));
        session.append_and_focus(item("b"));
        assert!(session.has_older());
        assert!(!session.has_newer());
        session.step_back().unwrap();
        assert!(!session.has_older());
        assert!(session.has_newer());
    }
}
