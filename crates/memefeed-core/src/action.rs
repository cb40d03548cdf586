//! Button actions and their compact callback encoding.
//!
//! Telegram limits callback data to 64 bytes, so actions travel as short
//! tags (`fd:3`). Decoding happens once at the transport edge; everything
//! past it works with [`Action`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NewItem,
    Back,
    Forward,
    ToggleFavorite,
    ShowFavorites,
    FavoritesBack(usize),
    FavoritesForward(usize),
    FavoritesDelete(usize),
    CloseFavorites,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized callback data: {0:?}")]
pub struct ParseActionError(String);

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NewItem => f.write_str("new"),
            Action::Back => f.write_str("prev"),
            Action::Forward => f.write_str("next"),
            Action::ToggleFavorite => f.write_str("fav"),
            Action::ShowFavorites => f.write_str("favs"),
            Action::FavoritesBack(pos) => write!(f, "fb:{pos}"),
            Action::FavoritesForward(pos) => write!(f, "ff:{pos}"),
            Action::FavoritesDelete(pos) => write!(f, "fd:{pos}"),
            Action::CloseFavorites => f.write_str("fc"),
        }
    }
}

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseActionError(data.to_string());
        let action = match data {
            "new" => Action::NewItem,
            "prev" => Action::Back,
            "next" => Action::Forward,
            "fav" => Action::ToggleFavorite,
            "favs" => Action::ShowFavorites,
            "fc" => Action::CloseFavorites,
            _ => {
                let (tag, pos) = data.split_once(':').ok_or_else(invalid)?;
                let pos: usize = pos.parse().ok().ok_or_else(invalid)?;
                match tag {
                    "fb" => Action::FavoritesBack(pos),
                    "ff" => Action::FavoritesForward(pos),
                    "fd" => Action::FavoritesDelete(pos),
                    _ => return Err(invalid()),
                }
            }
        };
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_actions_carry_payload() {
        assert_eq!("fd:12".parse::<Action>(), Ok(Action::FavoritesDelete(12)));
        assert_eq!(Action::FavoritesForward(3).to_string(), "ff:3");
    }

    #[test]
    fn every_action_decodes_from_its_encoding() {
        let actions = [
            Action::NewItem,
            Action::Back,
            Action::Forward,
            Action::ToggleFavorite,
            Action::ShowFavorites,
            Action::FavoritesBack(0),
            Action::FavoritesForward(41),
            Action::FavoritesDelete(7),
            Action::CloseFavorites,
        ];
        for action in actions {
            let encoded = action.to_string();
            assert!(encoded.len() <= 64);
            assert_eq!(encoded.parse::<Action>(), Ok(action));
        }
    }

    #[test]
    fn garbage_is_rejected() {
        assert!("fd:".parse::<Action>().is_err());
        assert!("fd:-1".parse::<Action>().is_err());
        assert!("zz:1".parse::<Action>().is_err());
        assert!("new_meme".parse::<Action>().is_err());
        assert!("".parse::<Action>().is_err());
    }
}
