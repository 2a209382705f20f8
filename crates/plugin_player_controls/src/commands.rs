//! Chat command table and parser.
//!
//! A chat line is a command when its first word matches a token in
//! [`COMMANDS`]. Tokens may carry a numeric suffix (`tb3`, `s2`), which is
//! split off before lookup and handed to the entry's parser. Lines that match
//! nothing are ordinary chat and parse to `None`.

use crate::error::CommandError;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Help,
    Teleport { location: String },
    Back { rank: usize },
    ListHistory,
    Appear { player_name: String },
    Speed { level: u32 },
}

/// Upper bounds that depend on configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLimits {
    /// Highest history rank (the history capacity)
    pub max_rank: usize,
    /// Highest speed level
    pub max_speed_level: u32,
}

type ParseFn = fn(Option<u32>, &str, &CommandLimits) -> Option<Result<ControlCommand, CommandError>>;

/// One row of the command table.
pub struct CommandEntry {
    pub token: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
    parse: ParseFn,
}

/// Every chat command the plugin understands.
pub static COMMANDS: &[CommandEntry] = &[
    CommandEntry {
        token: "pc",
        usage: "pc help",
        summary: "Display this help message.",
        parse: parse_help,
    },
    CommandEntry {
        token: "t",
        usage: "t <location>",
        summary: "Teleport to a named location.",
        parse: parse_teleport,
    },
    CommandEntry {
        token: "tb",
        usage: "tb[N] | tb list",
        summary: "Teleport back to your Nth most recent position (tb is tb1), or list saved positions.",
        parse: parse_back,
    },
    CommandEntry {
        token: "app",
        usage: "app <player>",
        summary: "Teleport to another player's location.",
        parse: parse_appear,
    },
    CommandEntry {
        token: "s",
        usage: "s<level>",
        summary: "Change your movement speed. s1 is normal speed.",
        parse: parse_speed,
    },
];

/// Parses a chat line.
///
/// Returns `None` for ordinary chat, `Some(Err)` when a known command was
/// given arguments it cannot accept.
pub fn parse_command(message: &str, limits: &CommandLimits) -> Option<Result<ControlCommand, CommandError>> {
    let message = message.trim();
    let (word, rest) = match message.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (message, ""),
    };
    if word.is_empty() {
        return None;
    }

    let word = word.to_ascii_lowercase();
    let (token, suffix) = split_numeric_suffix(&word)?;

    let entry = COMMANDS.iter().find(|entry| entry.token == token)?;
    (entry.parse)(suffix, rest, limits)
}

/// Builds the help text from the command table.
pub fn help_text(limits: &CommandLimits) -> String {
    let mut text = String::from("PlayerControls Module Commands:\n");
    for entry in COMMANDS {
        text.push_str(&format!("- {}: {}\n", entry.usage, entry.summary));
    }
    text.push_str(&format!(
        "Up to {} positions are remembered; speed levels go from 1 to {}.\n",
        limits.max_rank, limits.max_speed_level
    ));
    text
}

/// Splits `tb12` into `("tb", Some(12))`. A suffix too large for `u32` is
/// reported as `u32::MAX` so range checks reject it.
fn split_numeric_suffix(word: &str) -> Option<(&str, Option<u32>)> {
    match word.find(|c: char| c.is_ascii_digit()) {
        None => Some((word, None)),
        Some(0) => None,
        Some(at) => {
            let (token, digits) = word.split_at(at);
            if !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            Some((token, Some(digits.parse().unwrap_or(u32::MAX))))
        }
    }
}

fn usage_for(token: &str) -> CommandError {
    let usage = COMMANDS
        .iter()
        .find(|entry| entry.token == token)
        .map(|entry| entry.usage)
        .unwrap_or("pc help");
    CommandError { usage }
}

fn parse_help(suffix: Option<u32>, rest: &str, _: &CommandLimits) -> Option<Result<ControlCommand, CommandError>> {
    match (suffix, rest.to_ascii_lowercase().as_str()) {
        (None, "help") => Some(Ok(ControlCommand::Help)),
        _ => None,
    }
}

fn parse_teleport(suffix: Option<u32>, rest: &str, _: &CommandLimits) -> Option<Result<ControlCommand, CommandError>> {
    if suffix.is_some() {
        return None;
    }
    if rest.is_empty() {
        return Some(Err(usage_for("t")));
    }
    Some(Ok(ControlCommand::Teleport {
        location: rest.to_string(),
    }))
}

fn parse_back(suffix: Option<u32>, rest: &str, limits: &CommandLimits) -> Option<Result<ControlCommand, CommandError>> {
    match (suffix, rest.to_ascii_lowercase().as_str()) {
        (None, "list") => Some(Ok(ControlCommand::ListHistory)),
        (None, "") => Some(Ok(ControlCommand::Back { rank: 1 })),
        (Some(rank), "") => {
            let rank = rank as usize;
            if rank == 0 || rank > limits.max_rank {
                Some(Err(usage_for("tb")))
            } else {
                Some(Ok(ControlCommand::Back { rank }))
            }
        }
        _ => None,
    }
}

fn parse_appear(suffix: Option<u32>, rest: &str, _: &CommandLimits) -> Option<Result<ControlCommand, CommandError>> {
    if suffix.is_some() {
        return None;
    }
    if rest.is_empty() {
        return Some(Err(usage_for("app")));
    }
    Some(Ok(ControlCommand::Appear {
        player_name: rest.to_string(),
    }))
}

fn parse_speed(suffix: Option<u32>, rest: &str, limits: &CommandLimits) -> Option<Result<ControlCommand, CommandError>> {
    let level = suffix?;
    if !rest.is_empty() {
        return None;
    }
    if level == 0 || level > limits.max_speed_level {
        return Some(Err(usage_for("s")));
    }
    Some(Ok(ControlCommand::Speed { level }))
}
