//! Slash commands typed into issue comments.

use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_LOGIN_LENGTH: usize = 39;

/// Commands this plugin acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandName {
    /// Assign the sender and teammates.
    Start,
    /// Unassign the sender.
    Stop,
}

impl CommandName {
    /// Returns the command word without the leading slash.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }

    /// Parses a command word, ignoring case and an optional leading slash.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let word = trimmed.strip_prefix('/').unwrap_or(trimmed);
        if word.eq_ignore_ascii_case("start") {
            Some(Self::Start)
        } else if word.eq_ignore_ascii_case("stop") {
            Some(Self::Stop)
        } else {
            None
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command parsed from the first token of a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashCommand {
    /// Command word without the slash, lower-cased.
    pub name: String,
    /// Logins mentioned with `@`, in order of appearance.
    pub teammates: Vec<String>,
}

impl SlashCommand {
    /// Parses a comment body.
    ///
    /// Returns `None` when the body does not start with a `/word` token.
    #[must_use]
    pub fn parse(body: &str) -> Option<Self> {
        let first = body.split_whitespace().next()?;
        let word = first.strip_prefix('/')?;
        if word.is_empty() {
            return None;
        }
        let teammates = body
            .split('@')
            .skip(1)
            .map(|mention| {
                mention
                    .chars()
                    .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '-')
                    .collect::<String>()
            })
            .filter(|login| !login.is_empty())
            .collect();
        Some(Self {
            name: word.to_ascii_lowercase(),
            teammates,
        })
    }

    /// Returns the command this plugin acts on, if any.
    #[must_use]
    pub fn command(&self) -> Option<CommandName> {
        CommandName::parse(&self.name)
    }

    /// Returns the mentioned logins that are valid, are not the sender and
    /// appear for the first time.
    #[must_use]
    pub fn valid_teammates(&self, sender: &str) -> Vec<String> {
        filter_teammates(&self.teammates, sender)
    }
}

/// Keeps the mentions that are valid logins, are not `sender` and appear for
/// the first time, ignoring case.
#[must_use]
pub fn filter_teammates<S: AsRef<str>>(mentions: &[S], sender: &str) -> Vec<String> {
    let mut accepted: Vec<String> = Vec::new();
    for mention in mentions {
        let login = mention.as_ref().trim();
        if !is_valid_login(login)
            || login.eq_ignore_ascii_case(sender)
            || accepted
                .iter()
                .any(|existing| existing.eq_ignore_ascii_case(login))
        {
            continue;
        }
        accepted.push(login.to_owned());
    }
    accepted
}

/// Returns whether `login` is a syntactically valid GitHub login.
///
/// Logins are one to 39 ASCII alphanumerics or single hyphens and never start
/// or end with a hyphen.
#[must_use]
pub fn is_valid_login(login: &str) -> bool {
    !login.is_empty()
        && login.len() <= MAX_LOGIN_LENGTH
        && login
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
        && !login.starts_with('-')
        && !login.ends_with('-')
        && !login.contains("--")
}
