//! Captions and action menus for the main and favorites views.
//!
//! Captions use Telegram's HTML parse mode.

use crate::action::Action;
use crate::favorites::Favorites;
use crate::item::Item;
use crate::session::BrowsingSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: &'static str,
    pub action: Action,
}

impl Button {
    fn new(label: &'static str, action: Action) -> Self {
        Self { label, action }
    }
}

/// Rows of buttons attached to a rendered view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionMenu {
    pub rows: Vec<Vec<Button>>,
}

impl ActionMenu {
    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.rows.iter().flatten().map(|button| button.action)
    }

    pub fn has(&self, action: Action) -> bool {
        self.actions().any(|candidate| candidate == action)
    }

    pub fn label_for(&self, action: Action) -> Option<&'static str> {
        self.rows
            .iter()
            .flatten()
            .find(|button| button.action == action)
            .map(|button| button.label)
    }

    fn push_row(&mut self, row: Vec<Button>) {
        if !row.is_empty() {
            self.rows.push(row);
        }
    }
}

/// Everything a transport needs to show one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    pub media_url: String,
    pub caption: String,
    pub menu: ActionMenu,
}

pub const ADD_FAVORITE_LABEL: &str = "❤️ Add to favorites";
pub const REMOVE_FAVORITE_LABEL: &str = "❌ Remove from favorites";

/// Main view for the session's focused item; `None` before the first fetch.
pub fn render_main(session: &BrowsingSession, favorites: &Favorites) -> Option<RenderedView> {
    let item = session.current()?;
    Some(RenderedView {
        media_url: item.media_url().to_string(),
        caption: main_caption(item),
        menu: main_menu(session, favorites),
    })
}

/// Favorites view at `position`; `None` if the position is out of range.
pub fn render_favorites(favorites: &Favorites, position: usize) -> Option<RenderedView> {
    let item = favorites.get(position)?;
    Some(RenderedView {
        media_url: item.media_url().to_string(),
        caption: favorites_caption(item, position, favorites.len()),
        menu: favorites_menu(position, favorites.len()),
    })
}

pub fn main_caption(item: &Item) -> String {
    format!(
        "📌 <b>{origin}</b>\n🔥 <i>Score:</i> <b>{score}</b>\n📝 <i>{title}</i>\n\n{link}",
        origin = escape_html(item.origin()),
        score = group_thousands(item.score()),
        title = escape_html(item.title()),
        link = source_link(item),
    )
}

pub fn favorites_caption(item: &Item, position: usize, total: usize) -> String {
    format!(
        "⭐ <b>Favorites ({current}/{total})</b>\n\n📌 {origin}\n🔥 {score} | {title}\n\n{link}",
        current = position + 1,
        origin = escape_html(item.origin()),
        score = group_thousands(item.score()),
        title = escape_html(item.title()),
        link = source_link(item),
    )
}

pub fn main_menu(session: &BrowsingSession, favorites: &Favorites) -> ActionMenu {
    let mut menu = ActionMenu::default();
    let Some(current) = session.current() else {
        return menu;
    };

    let mut nav = Vec::new();
    if session.has_older() {
        nav.push(Button::new("◀️ Previous", Action::Back));
    }
    if session.has_newer() {
        nav.push(Button::new("Next ▶️", Action::Forward));
    } else {
        nav.push(Button::new("🔄 New", Action::NewItem));
    }
    menu.push_row(nav);

    let toggle_label = if favorites.contains(current.id()) {
        REMOVE_FAVORITE_LABEL
    } else {
        ADD_FAVORITE_LABEL
    };
    menu.push_row(vec![Button::new(toggle_label, Action::ToggleFavorite)]);

    if !favorites.is_empty() {
        menu.push_row(vec![Button::new("⭐ Favorites", Action::ShowFavorites)]);
    }
    menu
}

pub fn favorites_menu(position: usize, total: usize) -> ActionMenu {
    let mut menu = ActionMenu::default();
    let mut nav = Vec::new();
    if position > 0 {
        nav.push(Button::new("◀️", Action::FavoritesBack(position)));
    }
    if position + 1 < total {
        nav.push(Button::new("▶️", Action::FavoritesForward(position)));
    }
    menu.push_row(nav);
    menu.push_row(vec![
        Button::new("❌ Delete", Action::FavoritesDelete(position)),
        Button::new("◀️ Back", Action::CloseFavorites),
    ]);
    menu
}

/// `1234567` -> `1,234,567`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn source_link(item: &Item) -> String {
    format!("🔗 <a href='{}'>Source</a>", escape_html(item.source_url()))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
