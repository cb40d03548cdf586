//! Fetched media items.

use std::fmt;

/// Marker appended to titles cut at the configured maximum.
pub const ELLIPSIS: &str = "...";

/// Source-unique identity of an item. Equality key for deduplication and
/// membership tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One fetched media item. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: ItemId,
    media_url: String,
    title: String,
    score: u64,
    origin: String,
    source_url: String,
}

impl Item {
    /// Builds an item, cutting `title` to `max_title_len` characters.
    pub fn new(
        id: impl Into<ItemId>,
        media_url: impl Into<String>,
        title: &str,
        score: u64,
        origin: impl Into<String>,
        source_url: impl Into<String>,
        max_title_len: usize,
    ) -> Self {
        Self {
            id: id.into(),
            media_url: media_url.into(),
            title: truncate_title(title, max_title_len),
            score,
            origin: origin.into(),
            source_url: source_url.into(),
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn media_url(&self) -> &str {
        &self.media_url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Cuts `title` to `max_len` characters and appends [`ELLIPSIS`] when
/// anything was dropped. Counts chars, not bytes.
pub fn truncate_title(title: &str, max_len: usize) -> String {
    match title.char_indices().nth(max_len) {
        Some((byte_idx, _)) => format!("{}{ELLIPSIS}", &title[..byte_idx]),
        None => title.to_string(),
    }
}
