use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BotCommand {
    Start,
    Favorites,
    Clear,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TelegramCommandSpec {
    pub command: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CommandDef {
    command: BotCommand,
    patterns: &'static [&'static str],
    telegram_spec: TelegramCommandSpec,
}

const COMMAND_DEFS: &[CommandDef] = &[
    CommandDef {
        command: BotCommand::Start,
        patterns: &["/start"],
        telegram_spec: TelegramCommandSpec {
            command: "start",
            description: "Show a fresh meme",
        },
    },
    CommandDef {
        command: BotCommand::Favorites,
        patterns: &["/favorites", "/favs"],
        telegram_spec: TelegramCommandSpec {
            command: "favorites",
            description: "Browse your favorites",
        },
    },
    CommandDef {
        command: BotCommand::Clear,
        patterns: &["/clear"],
        telegram_spec: TelegramCommandSpec {
            command: "clear",
            description: "Remove every favorite",
        },
    },
    CommandDef {
        command: BotCommand::Help,
        patterns: &["/help"],
        telegram_spec: TelegramCommandSpec {
            command: "help",
            description: "List commands",
        },
    },
];

pub(crate) fn telegram_command_specs() -> Vec<TelegramCommandSpec> {
    COMMAND_DEFS.iter().map(|def| def.telegram_spec).collect()
}

pub(crate) fn parse_command(text: &str) -> Option<BotCommand> {
    let trimmed = text.trim();

    COMMAND_DEFS.iter().find_map(|def| {
        def.patterns
            .iter()
            .any(|pattern| command_matches(trimmed, pattern))
            .then_some(def.command)
    })
}

/// Text sent in reply to `/help`.
pub(crate) fn help_text() -> String {
    let mut text = String::from("<b>Commands</b>\n");
    for spec in telegram_command_specs() {
        text.push_str(&format!("/{} - {}\n", spec.command, spec.description));
    }
    text
}

fn command_matches(trimmed_text: &str, command: &str) -> bool {
    if trimmed_text == command {
        return true;
    }

    trimmed_text
        .strip_prefix(command)
        .is_some_and(|stripped| stripped.starts_with('@'))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{BotCommand, command_matches, help_text, parse_command, telegram_command_specs};

    #[test]
    fn parse_feed_commands() {
        assert_eq!(parse_command("/start"), Some(BotCommand::Start));
        assert_eq!(parse_command(" /start@meme_bot "), Some(BotCommand::Start));
        assert_eq!(parse_command("/favorites"), Some(BotCommand::Favorites));
        assert_eq!(parse_command("/favs"), Some(BotCommand::Favorites));
        assert_eq!(parse_command("/clear@meme_bot"), Some(BotCommand::Clear));
        assert_eq!(parse_command("/help"), Some(BotCommand::Help));
    }

    #[test]
    fn rejects_non_commands() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/start now"), None);
        assert_eq!(parse_command("/startle"), None);
    }

    #[test]
    fn command_matcher_accepts_bot_mentions_only() {
        assert!(command_matches("/clear", "/clear"));
        assert!(command_matches("/clear@meme_bot", "/clear"));
        assert!(!command_matches("/clear all", "/clear"));
    }

    #[test]
    fn telegram_command_specs_are_unique_and_non_empty() {
        let specs = telegram_command_specs();
        assert!(!specs.is_empty());

        let mut names = HashSet::new();
        for spec in specs {
            assert!(!spec.command.trim().is_empty());
            assert!(!spec.description.trim().is_empty());
            assert!(names.insert(spec.command));
        }
    }

    #[test]
    fn help_lists_every_command() {
        let help = help_text();
        for spec in telegram_command_specs() {
            assert!(help.contains(&format!("/{}", spec.command)));
        }
    }
}
