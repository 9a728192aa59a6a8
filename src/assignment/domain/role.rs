//! Organisation roles and the concurrency limits attached to them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Organisation permission tier of a user.
///
/// Membership look-ups return free-form strings; anything outside the known
/// tiers is kept as [`Role::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// Organisation administrator.
    Admin,
    /// Organisation member.
    Member,
    /// Outside contributor.
    Contributor,
    /// A role name this system does not know.
    Unrecognized(String),
}

impl Role {
    /// Maps a membership role name onto a tier, ignoring case.
    #[must_use]
    pub fn from_membership(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "member" => Self::Member,
            "contributor" => Self::Contributor,
            _ => Self::Unrecognized(raw.trim().to_owned()),
        }
    }

    /// Returns the settings key for known tiers.
    #[must_use]
    pub const fn config_key(&self) -> Option<&'static str> {
        match self {
            Self::Admin => Some("admin"),
            Self::Member => Some("member"),
            Self::Contributor => Some("contributor"),
            Self::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(raw) => f.write_str(raw),
            known => f.write_str(known.config_key().unwrap_or_default()),
        }
    }
}

/// Maximum number of open assignments a role may hold.
///
/// Ordered so that any finite limit is smaller than [`TaskLimit::Unlimited`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskLimit {
    /// At most this many concurrent assignments.
    Limited(u32),
    /// No cap.
    Unlimited,
}

impl TaskLimit {
    /// Returns whether a user holding `current` assignments may take one more.
    #[must_use]
    pub fn allows(self, current: usize) -> bool {
        match self {
            Self::Limited(limit) => usize::try_from(limit).is_ok_and(|limit| current < limit),
            Self::Unlimited => true,
        }
    }
}

impl fmt::Display for TaskLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(limit) => write!(f, "{limit}"),
            Self::Unlimited => f.write_str("Infinity"),
        }
    }
}

impl Serialize for TaskLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Limited(limit) => serializer.serialize_u32(*limit),
            Self::Unlimited => serializer.serialize_str("Infinity"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTaskLimit {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for TaskLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawTaskLimit::deserialize(deserializer)? {
            RawTaskLimit::Number(value) => u32::try_from(value).map(Self::Limited).map_err(|_| {
                serde::de::Error::custom(format!(
                    "task limit must be a non-negative integer, found {value}"
                ))
            }),
            RawTaskLimit::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "infinity" | "unlimited" => Ok(Self::Unlimited),
                _ => Err(serde::de::Error::custom(format!(
                    "task limit must be an integer or \"Infinity\", found \"{text}\""
                ))),
            },
        }
    }
}
