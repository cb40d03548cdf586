//! Core memefeed library (browsing sessions, favorites, view sync, config).

pub mod action;
pub mod config;
pub mod controller;
pub mod error;
pub mod favorites;
pub mod fetch;
pub mod item;
pub mod logging;
pub mod presentation;
pub mod session;
pub mod state;
pub mod sync;
pub mod transport;
pub mod views;

pub use controller::{FeedController, UserEvent};
pub use error::FeedError;

/// Crate version, shared by the bot's user agent and CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
