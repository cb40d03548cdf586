//! User-curated favorites: ordered, duplicate-free by identity.

use std::collections::HashSet;

use thiserror::Error;

use crate::item::{Item, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    /// Removed from `index`.
    Removed { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FavoritesError {
    #[error("favorite position {position} out of bounds (len {len})")]
    OutOfBounds { position: usize, len: usize },
}

/// Result of a positional removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub item: Item,
    pub index: usize,
    /// Where a view showing `index` should land next; `None` once empty.
    pub focus: Option<usize>,
}

#[derive(Debug, Default)]
pub struct Favorites {
    items: Vec<Item>,
    ids: HashSet<ItemId>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes `item` if pinned, otherwise appends it.
    pub fn toggle(&mut self, item: &Item) -> Toggle {
        if let Some(index) = self.position_of(item.id()) {
            let removed = self.items.remove(index);
            self.ids.remove(removed.id());
            Toggle::Removed { index }
        } else {
            self.ids.insert(item.id().clone());
            self.items.push(item.clone());
            Toggle::Added
        }
    }

    pub fn remove_at(&mut self, position: usize) -> Result<Removal, FavoritesError> {
        if position >= self.items.len() {
            return Err(FavoritesError::OutOfBounds {
                position,
                len: self.items.len(),
            });
        }
        let item = self.items.remove(position);
        self.ids.remove(item.id());
        Ok(Removal {
            item,
            index: position,
            focus: follow_on_focus(position, self.items.len()),
        })
    }

    /// Neighbouring position clamped to the collection; `None` when empty.
    pub fn navigate(&self, position: usize, direction: Direction) -> Option<usize> {
        let last = self.items.len().checked_sub(1)?;
        let next = match direction {
            Direction::Back => position.saturating_sub(1),
            Direction::Forward => position.saturating_add(1),
        };
        Some(next.min(last))
    }

    /// Drops every favorite and returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        self.ids.clear();
        count
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    pub fn position_of(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn get(&self, position: usize) -> Option<&Item> {
        self.items.get(position)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// `min(position, len - 1)`, or `None` for an empty collection.
pub fn follow_on_focus(position: usize, len: usize) -> Option<usize> {
    len.checked_sub(1).map(|last| position.min(last))
}
