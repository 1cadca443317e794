use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two reactions a user may leave on someone else's comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }

    /// "liked" / "disliked", for user-facing messages.
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Like => "liked",
            Self::Dislike => "disliked",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            other => Err(format!("unknown reaction kind '{}'", other)),
        }
    }
}

/// Color scheme of the rendered badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    Dark,
    #[default]
    Light,
    Transparent,
}

impl Theme {
    /// Lenient parse used for the `?theme=` query parameter. `black` and
    /// `white` are accepted for links embedded before the dark/light names
    /// existed; anything unrecognised falls back to light.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("dark") | Some("black") => Self::Dark,
            Some("transparent") => Self::Transparent,
            _ => Self::Light,
        }
    }

    /// (background, foreground)
    pub fn colors(self) -> (&'static str, &'static str) {
        match self {
            Self::Dark => ("black", "white"),
            Self::Light => ("white", "black"),
            Self::Transparent => ("transparent", "gray"),
        }
    }
}
