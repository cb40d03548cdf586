//! Executes user entry points against the feed state and the transport.
//!
//! Each event runs under the state lock, which is released only while the
//! content source is queried. Events for one chat arrive one at a time, so
//! they are applied strictly in arrival order. Render failures never roll
//! state back: the in-memory model stays mutated and the user gets a generic
//! notice.

use tokio::sync::{Mutex, MutexGuard};

use crate::action::Action;
use crate::config::SessionScope;
use crate::error::FeedError;
use crate::favorites::{Direction, Toggle};
use crate::fetch::{ContentSource, DedupFetcher};
use crate::item::truncate_title;
use crate::presentation::{RenderedView, main_menu, render_favorites, render_main};
use crate::session::Boundary;
use crate::state::FeedBook;
use crate::sync::{Mutation, ViewUpdate, reconcile};
use crate::transport::{EventOrigin, Notice, Transport, TransportError};
use crate::views::{ChatId, MessageId};

const DELETED_TITLE_PREVIEW: usize = 30;

/// A user-initiated event, decoded from a command or a button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserEvent {
    StartSession,
    ClearFavorites,
    Action(Action),
}

impl From<Action> for UserEvent {
    fn from(action: Action) -> Self {
        UserEvent::Action(action)
    }
}

pub struct FeedController<T, S> {
    transport: T,
    fetcher: DedupFetcher<S>,
    book: Mutex<FeedBook>,
}

impl<T: Transport, S: ContentSource> FeedController<T, S> {
    pub fn new(transport: T, fetcher: DedupFetcher<S>, scope: SessionScope) -> Self {
        Self {
            transport,
            fetcher,
            book: Mutex::new(FeedBook::new(scope)),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Read access to the state, for inspection.
    pub async fn with_book<R>(&self, read: impl FnOnce(&FeedBook) -> R) -> R {
        read(&*self.book.lock().await)
    }

    /// Handles one event and answers it exactly once.
    pub async fn handle(&self, origin: &EventOrigin, event: UserEvent) {
        let notice = match self.dispatch(origin, event).await {
            Ok(notice) => notice,
            Err(err) => {
                match &err {
                    FeedError::InvariantViolation(_) | FeedError::RenderFailure => {
                        tracing::warn!(chat = origin.chat, ?event, error = %err, "event failed");
                    }
                    _ => tracing::debug!(chat = origin.chat, ?event, error = %err, "event rejected"),
                }
                Some(Notice::info(err.user_message()))
            }
        };
        self.transport.notify(origin, notice.as_ref()).await;
    }

    async fn dispatch(
        &self,
        origin: &EventOrigin,
        event: UserEvent,
    ) -> Result<Option<Notice>, FeedError> {
        let mut book = self.book.lock().await;
        match event {
            UserEvent::StartSession => self.request_new(book, origin, None).await,
            UserEvent::ClearFavorites => self.clear_favorites(&mut book, origin).await,
            UserEvent::Action(action) => match action {
                Action::NewItem => self.request_new(book, origin, origin.message_id).await,
                Action::Back => self.step(&mut book, origin, Boundary::Oldest).await,
                Action::Forward => self.step(&mut book, origin, Boundary::Newest).await,
                Action::ToggleFavorite => self.toggle_favorite(&mut book, origin).await,
                Action::ShowFavorites => self.open_favorites(&mut book, origin).await,
                Action::FavoritesBack(pos) => {
                    self.favorites_step(&mut book, origin, pos, Direction::Back)
                        .await
                }
                Action::FavoritesForward(pos) => {
                    self.favorites_step(&mut book, origin, pos, Direction::Forward)
                        .await
                }
                Action::FavoritesDelete(pos) => {
                    self.favorites_delete(&mut book, origin, pos).await
                }
                Action::CloseFavorites => self.close_favorites(&mut book, origin).await,
            },
        }
    }

    /// Fetches an unseen item and shows it, editing `target` when given and
    /// sending a new main message otherwise.
    ///
    /// The lock is released while the source is queried so other chats are
    /// not held up by a slow fetch.
    async fn request_new(
        &self,
        book: MutexGuard<'_, FeedBook>,
        origin: &EventOrigin,
        target: Option<MessageId>,
    ) -> Result<Option<Notice>, FeedError> {
        let seen = book
            .feed(origin.chat)
            .map(|feed| feed.session.seen().clone())
            .unwrap_or_default();
        drop(book);

        let item = self
            .fetcher
            .fetch_unseen(&seen)
            .await
            .ok_or(FeedError::Unavailable)?;

        let mut book = self.book.lock().await;
        tracing::info!(chat = origin.chat, item = %item.id(), "showing new item");
        // A shared feed may have picked up the same item meanwhile; it is
        // focused rather than appended twice.
        book.feed_mut(origin.chat).session.append_and_focus(item);
        self.show_main(&mut book, origin.chat, target).await?;
        Ok(None)
    }

    async fn step(
        &self,
        book: &mut FeedBook,
        origin: &EventOrigin,
        towards: Boundary,
    ) -> Result<Option<Notice>, FeedError> {
        let session = &mut book.feed_mut(origin.chat).session;
        match towards {
            Boundary::Oldest => session.step_back()?,
            Boundary::Newest => session.step_forward()?,
        };
        self.show_main(book, origin.chat, origin.message_id).await?;
        Ok(None)
    }

    async fn show_main(
        &self,
        book: &mut FeedBook,
        chat: ChatId,
        target: Option<MessageId>,
    ) -> Result<(), FeedError> {
        let feed = book.feed_mut(chat);
        let view = render_main(&feed.session, &feed.favorites)
            .ok_or(FeedError::InvariantViolation("main view without a focused item"))?;
        let message_id = match target {
            Some(message_id) => match self.transport.render_edit(chat, message_id, &view).await {
                Ok(()) => message_id,
                Err(TransportError::MessageGone(_)) => {
                    book.views_mut().forget_main_message(chat, message_id);
                    self.send_new(chat, &view).await?
                }
                Err(err) => return Err(render_failed(chat, &err)),
            },
            None => self.send_new(chat, &view).await?,
        };
        book.views_mut().set_main_message(chat, message_id);
        Ok(())
    }

    async fn send_new(&self, chat: ChatId, view: &RenderedView) -> Result<MessageId, FeedError> {
        self.transport
            .render_new(chat, view)
            .await
            .map_err(|err| render_failed(chat, &err))
    }

    async fn toggle_favorite(
        &self,
        book: &mut FeedBook,
        origin: &EventOrigin,
    ) -> Result<Option<Notice>, FeedError> {
        let chat = origin.chat;
        let chats = book.chats_sharing(chat);
        let (feed, views) = book.split_mut(chat);
        let current = feed
            .session
            .current()
            .cloned()
            .ok_or(FeedError::NoSession)?;
        if let Some(message_id) = origin.message_id {
            views.set_main_message(chat, message_id);
        }

        let toggle = feed.favorites.toggle(&current);
        let mutation = Mutation::Toggled {
            item: current.id().clone(),
            toggle,
        };
        let updates = reconcile(&mutation, &chats, &feed.session, &feed.favorites, views);
        self.apply(book, chat, updates).await?;

        let text = match toggle {
            Toggle::Added => "★ Added to favorites",
            Toggle::Removed { .. } => "Removed from favorites",
        };
        Ok(Some(Notice::info(text)))
    }

    async fn open_favorites(
        &self,
        book: &mut FeedBook,
        origin: &EventOrigin,
    ) -> Result<Option<Notice>, FeedError> {
        let chat = origin.chat;
        if book.views().favorites(chat).is_open() {
            return Err(FeedError::AlreadyOpen);
        }
        let view = book
            .feed(chat)
            .and_then(|feed| render_favorites(&feed.favorites, 0))
            .ok_or(FeedError::FavoritesEmpty)?;
        let message_id = self.send_new(chat, &view).await?;
        book.views_mut().open_favorites(chat, message_id, 0)?;
        Ok(None)
    }

    async fn favorites_step(
        &self,
        book: &mut FeedBook,
        origin: &EventOrigin,
        shown: usize,
        direction: Direction,
    ) -> Result<Option<Notice>, FeedError> {
        let chat = origin.chat;
        let (message_id, position) = open_favorites_view(book, origin, shown)?;
        let next = book
            .feed(chat)
            .and_then(|feed| feed.favorites.navigate(position, direction));
        let Some(next) = next else {
            self.close_view(book, chat).await;
            return Err(FeedError::FavoritesEmpty);
        };
        if next == position {
            return Err(FeedError::BoundaryReached(match direction {
                Direction::Back => Boundary::Oldest,
                Direction::Forward => Boundary::Newest,
            }));
        }

        let view = book
            .feed(chat)
            .and_then(|feed| render_favorites(&feed.favorites, next))
            .ok_or(FeedError::InvariantViolation("favorites position out of range"))?;
        match self.transport.render_edit(chat, message_id, &view).await {
            Ok(()) => {
                book.views_mut().set_favorites_position(chat, next);
                Ok(None)
            }
            Err(TransportError::MessageGone(_)) => {
                book.views_mut().close_favorites(chat);
                Err(FeedError::ViewClosed)
            }
            Err(err) => Err(render_failed(chat, &err)),
        }
    }

    async fn favorites_delete(
        &self,
        book: &mut FeedBook,
        origin: &EventOrigin,
        shown: usize,
    ) -> Result<Option<Notice>, FeedError> {
        let chat = origin.chat;
        let (_, position) = open_favorites_view(book, origin, shown)?;
        let chats = book.chats_sharing(chat);
        let (feed, views) = book.split_mut(chat);
        let removal = feed
            .favorites
            .remove_at(position)
            .map_err(|err| {
                tracing::warn!(chat, error = %err, "favorites view out of range");
                FeedError::InvariantViolation("favorite position out of range")
            })?;
        let text = format!(
            "Deleted: {}",
            truncate_title(removal.item.title(), DELETED_TITLE_PREVIEW)
        );
        views.set_favorites_position(chat, position);

        let mutation = Mutation::Removed(removal);
        let updates = reconcile(&mutation, &chats, &feed.session, &feed.favorites, views);
        self.apply(book, chat, updates).await?;
        Ok(Some(Notice::info(text)))
    }

    async fn close_favorites(
        &self,
        book: &mut FeedBook,
        origin: &EventOrigin,
    ) -> Result<Option<Notice>, FeedError> {
        let chat = origin.chat;
        let message_id = origin
            .message_id
            .ok_or(FeedError::InvariantViolation("close without a favorites message"))?;
        if book.views().favorites_position(chat, message_id).is_some() {
            book.views_mut().close_favorites(chat);
        }
        match self.transport.delete(chat, message_id).await {
            Ok(()) | Err(TransportError::MessageGone(_)) => {}
            Err(err) => return Err(render_failed(chat, &err)),
        }

        let has_item = book
            .feed(chat)
            .is_some_and(|feed| feed.session.current().is_some());
        if !has_item {
            return Ok(Some(Notice::info(FeedError::NoSession.user_message())));
        }
        if book.views().main_message(chat).is_none() {
            self.show_main(book, chat, None).await?;
        }
        Ok(None)
    }

    async fn clear_favorites(
        &self,
        book: &mut FeedBook,
        origin: &EventOrigin,
    ) -> Result<Option<Notice>, FeedError> {
        let chat = origin.chat;
        let chats = book.chats_sharing(chat);
        let (feed, views) = book.split_mut(chat);
        let count = feed.favorites.clear();
        if count == 0 {
            return Err(FeedError::FavoritesEmpty);
        }
        let updates = reconcile(
            &Mutation::Cleared { count },
            &chats,
            &feed.session,
            &feed.favorites,
            views,
        );
        self.apply(book, chat, updates).await?;
        Ok(Some(Notice::info(format!("Favorites cleared ({count})"))))
    }

    /// Closes `chat`'s favorites view and deletes its message.
    async fn close_view(&self, book: &mut FeedBook, chat: ChatId) {
        if let Some(message_id) = book.views_mut().close_favorites(chat)
            && let Err(err) = self.transport.delete(chat, message_id).await
        {
            tracing::warn!(chat, message_id, error = %err, "failed to delete favorites view");
        }
    }

    /// Executes synchronizer output. A failure rendering `origin_chat`'s
    /// views is reported; failures in other chats are only logged.
    async fn apply(
        &self,
        book: &mut FeedBook,
        origin_chat: ChatId,
        updates: Vec<ViewUpdate>,
    ) -> Result<(), FeedError> {
        let mut failed = false;
        for update in updates {
            let (chat, result) = match update {
                ViewUpdate::RefreshMainMenu { chat, message_id } => {
                    let menu = book
                        .feed(chat)
                        .map(|feed| main_menu(&feed.session, &feed.favorites))
                        .unwrap_or_default();
                    let result = self
                        .transport
                        .render_menu_edit(chat, message_id, &menu)
                        .await;
                    if let Err(TransportError::MessageGone(_)) = result {
                        book.views_mut().forget_main_message(chat, message_id);
                    }
                    (chat, result)
                }
                ViewUpdate::RenderFavorites {
                    chat,
                    message_id,
                    position,
                } => {
                    let Some(view) = book
                        .feed(chat)
                        .and_then(|feed| render_favorites(&feed.favorites, position))
                    else {
                        continue;
                    };
                    let result = self.transport.render_edit(chat, message_id, &view).await;
                    if let Err(TransportError::MessageGone(_)) = result {
                        book.views_mut().close_favorites(chat);
                    }
                    (chat, result)
                }
                ViewUpdate::DeleteFavorites { chat, message_id } => {
                    (chat, self.transport.delete(chat, message_id).await)
                }
            };

            match result {
                Ok(()) | Err(TransportError::MessageGone(_)) => {}
                Err(err) => {
                    render_failed(chat, &err);
                    failed |= chat == origin_chat;
                }
            }
        }
        if failed {
            Err(FeedError::RenderFailure)
        } else {
            Ok(())
        }
    }
}

/// The open favorites message `origin` was pressed on, with the position it
/// is registered at.
///
/// The registry position wins over the one carried by the button: a failed
/// re-render can leave the message showing an older menu.
fn open_favorites_view(
    book: &FeedBook,
    origin: &EventOrigin,
    shown: usize,
) -> Result<(MessageId, usize), FeedError> {
    let message_id = origin.message_id.ok_or(FeedError::ViewClosed)?;
    let position = book
        .views()
        .favorites_position(origin.chat, message_id)
        .ok_or(FeedError::ViewClosed)?;
    if position != shown {
        tracing::debug!(chat = origin.chat, shown, position, "stale favorites button");
    }
    Ok((message_id, position))
}

fn render_failed(chat: ChatId, err: &TransportError) -> FeedError {
    tracing::warn!(chat, error = %err, "render failed");
    FeedError::RenderFailure
}
