//! Keeps the main view and the favorites view consistent after a
//! favorites mutation.
//!
//! [`reconcile`] updates the [`ViewRegistry`] to the post-mutation state and
//! returns the transport work needed to bring the rendered messages in line.
//! Rendering failures are the caller's concern; the registry is not rolled
//! back when a render fails.

use crate::favorites::{Favorites, Removal, Toggle};
use crate::item::ItemId;
use crate::session::BrowsingSession;
use crate::views::{ChatId, FavoritesView, MessageId, ViewRegistry};

/// A change that was just applied to a favorites collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Main-view toggle of the focused item.
    Toggled { item: ItemId, toggle: Toggle },
    /// Positional delete from a favorites view.
    Removed(Removal),
    /// Every favorite dropped; `count` is how many there were.
    Cleared { count: usize },
}

impl Mutation {
    fn touches(&self, id: &ItemId) -> bool {
        match self {
            Mutation::Toggled { item, .. } => item == id,
            Mutation::Removed(removal) => removal.item.id() == id,
            Mutation::Cleared { count } => *count > 0,
        }
    }

    /// Whether the collection went from empty to non-empty or back.
    fn flips_emptiness(&self, favorites: &Favorites) -> bool {
        match self {
            Mutation::Toggled {
                toggle: Toggle::Added,
                ..
            } => favorites.len() == 1,
            Mutation::Toggled {
                toggle: Toggle::Removed { .. },
                ..
            }
            | Mutation::Removed(_) => favorites.is_empty(),
            Mutation::Cleared { count } => *count > 0,
        }
    }

    /// Index the mutation removed, if any.
    fn removed_index(&self) -> Option<usize> {
        match self {
            Mutation::Toggled {
                toggle: Toggle::Removed { index },
                ..
            } => Some(*index),
            Mutation::Removed(removal) => Some(removal.index),
            Mutation::Toggled {
                toggle: Toggle::Added,
                ..
            }
            | Mutation::Cleared { .. } => None,
        }
    }
}

/// Transport work produced by [`reconcile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewUpdate {
    /// Rebuild the main message's action menu; caption unchanged.
    RefreshMainMenu { chat: ChatId, message_id: MessageId },
    /// Re-render the favorites message (caption, media, and menu).
    RenderFavorites {
        chat: ChatId,
        message_id: MessageId,
        position: usize,
    },
    /// Delete the favorites message; the registry entry is already gone.
    DeleteFavorites { chat: ChatId, message_id: MessageId },
}

/// Applies the synchronization rules for `mutation` to every chat in
/// `chats` (the chats sharing `session` and `favorites`).
///
/// Rules, per chat:
/// 1. An empty collection closes the favorites view.
/// 2. A non-empty collection re-renders an open favorites view at its
///    follow-on position.
/// 3. The main view's menu is refreshed when its focused item changed
///    favorited state or the "show favorites" button appears/disappears.
pub fn reconcile(
    mutation: &Mutation,
    chats: &[ChatId],
    session: &BrowsingSession,
    favorites: &Favorites,
    views: &mut ViewRegistry,
) -> Vec<ViewUpdate> {
    let mut updates = Vec::new();
    let refresh_main = mutation.flips_emptiness(favorites)
        || session
            .current()
            .is_some_and(|current| mutation.touches(current.id()));

    for &chat in chats {
        if let FavoritesView::Open {
            message_id,
            position,
        } = views.favorites(chat)
        {
            match next_position(position, mutation.removed_index(), favorites.len()) {
                Some(position) => {
                    views.set_favorites_position(chat, position);
                    updates.push(ViewUpdate::RenderFavorites {
                        chat,
                        message_id,
                        position,
                    });
                }
                None => {
                    views.close_favorites(chat);
                    updates.push(ViewUpdate::DeleteFavorites { chat, message_id });
                }
            }
        }

        if refresh_main && let Some(message_id) = views.main_message(chat) {
            updates.push(ViewUpdate::RefreshMainMenu { chat, message_id });
        }
    }

    updates
}

/// Position an open view lands on after a removal at `removed` (or an
/// append). A view past the removed slot shifts down to keep showing the
/// same item; a view on the removed slot moves to `min(slot, len - 1)`.
fn next_position(position: usize, removed: Option<usize>, len: usize) -> Option<usize> {
    let last = len.checked_sub(1)?;
    let shifted = match removed {
        Some(index) if index < position => position - 1,
        _ => position,
    };
    Some(shifted.min(last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;

    fn item(id: &str) -> Item {
        Item::new(id, format!("https://i.redd.it/{id}.gif"), id, 7000, "r/memes", "", 250)
    }

    fn favorites_of(ids: &[&str]) -> Favorites {
        let mut favorites = Favorites::new();
        for id in ids {
            favorites.toggle(&item(id));
        }
        favorites
    }

    #[test]
    fn delete_middle_rerenders_at_same_slot() {
        let session = BrowsingSession::new();
        let mut favorites = favorites_of(&["x", "y", "z"]);
        let mut views = ViewRegistry::new();
        views.open_favorites(1, 50, 1).unwrap();

        let removal = favorites.remove_at(1).unwrap();
        let updates = reconcile(
            &Mutation::Removed(removal),
            &[1],
            &session,
            &favorites,
            &mut views,
        );

        assert_eq!(
            updates,
            [ViewUpdate::RenderFavorites {
                chat: 1,
                message_id: 50,
                position: 1
            }]
        );
        assert_eq!(views.favorites_position(1, 50), Some(1));
        assert_eq!(favorites.get(1).unwrap().id().as_str(), "z");
    }

    #[test]
    fn deleting_last_favorite_closes_view_and_refreshes_main() {
        let mut session = BrowsingSession::new();
        session.append_and_focus(item("a"));
        session.append_and_focus(item("b"));
        session.step_back().unwrap();
        let mut favorites = favorites_of(&["a"]);
        let mut views = ViewRegistry::new();
        views.set_main_message(1, 40);
        views.open_favorites(1, 50, 0).unwrap();

        let removal = favorites.remove_at(0).unwrap();
        let updates = reconcile(
            &Mutation::Removed(removal),
            &[1],
            &session,
            &favorites,
            &mut views,
        );

        assert_eq!(
            updates,
            [
                ViewUpdate::DeleteFavorites {
                    chat: 1,
                    message_id: 50
                },
                ViewUpdate::RefreshMainMenu {
                    chat: 1,
                    message_id: 40
                },
            ]
        );
        assert!(!views.favorites(1).is_open());
    }

    #[test]
    fn main_toggle_with_open_view_rerenders_both() {
        let mut session = BrowsingSession::new();
        session.append_and_focus(item("a"));
        let mut favorites = favorites_of(&["x"]);
        let mut views = ViewRegistry::new();
        views.set_main_message(1, 40);
        views.open_favorites(1, 50, 0).unwrap();

        let toggle = favorites.toggle(&item("a"));
        let updates = reconcile(
            &Mutation::Toggled {
                item: ItemId::new("a"),
                toggle,
            },
            &[1],
            &session,
            &favorites,
            &mut views,
        );

        assert_eq!(
            updates,
            [
                ViewUpdate::RenderFavorites {
                    chat: 1,
                    message_id: 50,
                    position: 0
                },
                ViewUpdate::RefreshMainMenu {
                    chat: 1,
                    message_id: 40
                },
            ]
        );
    }

    #[test]
    fn removal_before_view_shifts_position_down() {
        let mut session = BrowsingSession::new();
        session.append_and_focus(item("x"));
        let mut favorites = favorites_of(&["x", "y", "z"]);
        let mut views = ViewRegistry::new();
        views.open_favorites(1, 50, 2).unwrap();

        let toggle = favorites.toggle(&item("x"));
        reconcile(
            &Mutation::Toggled {
                item: ItemId::new("x"),
                toggle,
            },
            &[1],
            &session,
            &favorites,
            &mut views,
        );

        assert_eq!(views.favorites_position(1, 50), Some(1));
        assert_eq!(favorites.get(1).unwrap().id().as_str(), "z");
    }

    #[test]
    fn unrelated_removal_leaves_main_alone() {
        let mut session = BrowsingSession::new();
        session.append_and_focus(item("a"));
        let mut favorites = favorites_of(&["x", "y"]);
        let mut views = ViewRegistry::new();
        views.set_main_message(1, 40);
        views.open_favorites(1, 50, 0).unwrap();

        let removal = favorites.remove_at(0).unwrap();
        let updates = reconcile(
            &Mutation::Removed(removal),
            &[1],
            &session,
            &favorites,
            &mut views,
        );

        assert_eq!(
            updates,
            [ViewUpdate::RenderFavorites {
                chat: 1,
                message_id: 50,
                position: 0
            }]
        );
    }

    #[test]
    fn shared_scope_reconciles_every_chat() {
        let mut session = BrowsingSession::new();
        session.append_and_focus(item("a"));
        let mut favorites = favorites_of(&["a"]);
        let mut views = ViewRegistry::new();
        views.open_favorites(1, 50, 0).unwrap();
        views.open_favorites(2, 60, 0).unwrap();
        views.set_main_message(2, 61);

        let count = favorites.clear();
        let updates = reconcile(
            &Mutation::Cleared { count },
            &[1, 2],
            &session,
            &favorites,
            &mut views,
        );

        assert!(updates.contains(&ViewUpdate::DeleteFavorites {
            chat: 1,
            message_id: 50
        }));
        assert!(updates.contains(&ViewUpdate::DeleteFavorites {
            chat: 2,
            message_id: 60
        }));
        assert!(updates.contains(&ViewUpdate::RefreshMainMenu {
            chat: 2,
            message_id: 61
        }));
        assert_eq!(updates.len(), 3);
    }

    #[test]
    fn clearing_nothing_is_silent() {
        let session = BrowsingSession::new();
        let favorites = Favorites::new();
        let mut views = ViewRegistry::new();
        views.set_main_message(1, 40);
        let updates = reconcile(
            &Mutation::Cleared { count: 0 },
            &[1],
            &session,
            &favorites,
            &mut views,
        );
        assert!(updates.is_empty());
    }
}
