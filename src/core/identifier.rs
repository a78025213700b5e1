use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::IdentifierError;

static ID_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"id=([0-9]+)").unwrap());

/// A validated playlist identifier: non-empty, ASCII digits only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistId(String);

impl PlaylistId {
    /// Extract the playlist id from user input.
    ///
    /// Supported forms:
    /// - "https://music.163.com/#/playlist?id=2619366284&userid=1" (first `id=` digits win)
    /// - "2619366284"
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let input = input.trim();

        if let Some(caps) = ID_PARAM.captures(input) {
            return Ok(Self(caps[1].to_string()));
        }

        if is_all_digits(input) {
            return Ok(Self(input.to_string()));
        }

        Err(IdentifierError::Invalid(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for PlaylistId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
