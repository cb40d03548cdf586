//! User-facing failure taxonomy.
//!
//! None of these are fatal: each one maps to a notice shown to the user and
//! the process keeps serving other chats.

use thiserror::Error;

use crate::session::Boundary;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The content source had nothing matching the filters (or failed).
    #[error("no new items available")]
    Unavailable,
    #[error("navigation stopped at the {0} item")]
    BoundaryReached(Boundary),
    #[error("render failed")]
    RenderFailure,
    /// A state the event flow should never reach.
    #[error("invariant violated: {0}")]
    InvariantViolation(&'static str),
    #[error("favorites view is closed")]
    ViewClosed,
    #[error("favorites view already open")]
    AlreadyOpen,
    #[error("favorites are empty")]
    FavoritesEmpty,
    #[error("no session started")]
    NoSession,
}

impl FeedError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            FeedError::Unavailable => "😢 No new memes available. Try later!",
            FeedError::BoundaryReached(Boundary::Oldest) => "This is the first meme",
            FeedError::BoundaryReached(Boundary::Newest) => "Press '🔄 New' for a fresh one",
            FeedError::RenderFailure => "⚠️ Update failed",
            FeedError::InvariantViolation(_) => "⚠️ Error: meme not found",
            FeedError::ViewClosed => "This favorites view is closed",
            FeedError::AlreadyOpen => "Favorites already open",
            FeedError::FavoritesEmpty => "Favorites are empty",
            FeedError::NoSession => "Start with /start",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_messages_differ_by_direction() {
        let oldest = FeedError::BoundaryReached(Boundary::Oldest);
        let newest = FeedError::BoundaryReached(Boundary::Newest);
        assert_ne!(oldest.user_message(), newest.user_message());
        assert!(newest.user_message().contains("New"));
    }

    #[test]
    fn display_includes_invariant_detail() {
        let err = FeedError::InvariantViolation("no focused item");
        assert_eq!(err.to_string(), "invariant violated: no focused item");
    }
}
