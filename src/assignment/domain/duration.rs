//! Human-readable durations such as `1 Day` or `<2 Weeks`.

use super::AssignmentDomainError;
use chrono::TimeDelta;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Calendar units accepted in durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationUnit {
    /// One second.
    Second,
    /// Sixty seconds.
    Minute,
    /// Sixty minutes.
    Hour,
    /// Twenty-four hours.
    Day,
    /// Seven days.
    Week,
    /// Thirty days.
    Month,
    /// Three hundred and sixty-five days.
    Year,
}

impl DurationUnit {
    /// Parses a singular or plural unit name, ignoring case.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        match singular {
            "second" | "sec" => Some(Self::Second),
            "minute" | "min" => Some(Self::Minute),
            "hour" | "hr" => Some(Self::Hour),
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    /// Returns the display name for `amount` of this unit, e.g. `Days`.
    #[must_use]
    pub const fn label(self, amount: u32) -> &'static str {
        let plural = amount != 1;
        match (self, plural) {
            (Self::Second, false) => "Second",
            (Self::Second, true) => "Seconds",
            (Self::Minute, false) => "Minute",
            (Self::Minute, true) => "Minutes",
            (Self::Hour, false) => "Hour",
            (Self::Hour, true) => "Hours",
            (Self::Day, false) => "Day",
            (Self::Day, true) => "Days",
            (Self::Week, false) => "Week",
            (Self::Week, true) => "Weeks",
            (Self::Month, false) => "Month",
            (Self::Month, true) => "Months",
            (Self::Year, false) => "Year",
            (Self::Year, true) => "Years",
        }
    }

    /// Returns the unit length in seconds.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        match self {
            Self::Second => 1,
            Self::Minute => SECONDS_PER_MINUTE,
            Self::Hour => SECONDS_PER_HOUR,
            Self::Day => SECONDS_PER_DAY,
            Self::Week => 7 * SECONDS_PER_DAY,
            Self::Month => 30 * SECONDS_PER_DAY,
            Self::Year => 365 * SECONDS_PER_DAY,
        }
    }
}

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*<?\s*(\d+)\s*([A-Za-z]+)\s*$").expect("valid duration pattern")
    })
}

/// A duration written for humans, keeping its original text.
///
/// # Examples
///
///     use start_stop::assignment::domain::HumanDuration;
///
///     let tolerance = HumanDuration::parse("1 Day").expect("valid duration");
///     assert_eq!(tolerance.as_delta().num_hours(), 24);
///     assert_eq!(tolerance.to_string(), "1 Day");
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanDuration {
    text: String,
    delta: TimeDelta,
}

impl HumanDuration {
    /// Creates a duration of `amount` units, rendered as e.g. `30 Days`.
    #[must_use]
    pub fn new(amount: u32, unit: DurationUnit) -> Self {
        let seconds = i64::from(amount).saturating_mul(unit.seconds());
        Self {
            text: format!("{amount} {}", unit.label(amount)),
            delta: TimeDelta::try_seconds(seconds).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Parses `<amount> <unit>`, optionally prefixed by `<`.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::InvalidDuration`] when the text does
    /// not match, the unit is unknown, or the value overflows.
    pub fn parse(raw: &str) -> Result<Self, AssignmentDomainError> {
        let invalid = || AssignmentDomainError::InvalidDuration(raw.to_owned());
        let captures = duration_pattern().captures(raw).ok_or_else(invalid)?;
        let amount: i64 = captures
            .get(1)
            .and_then(|value| value.as_str().parse().ok())
            .ok_or_else(invalid)?;
        let unit = captures
            .get(2)
            .and_then(|value| DurationUnit::parse(value.as_str()))
            .ok_or_else(invalid)?;
        let seconds = amount.checked_mul(unit.seconds()).ok_or_else(invalid)?;
        let delta = TimeDelta::try_seconds(seconds).ok_or_else(invalid)?;
        Ok(Self {
            text: raw.trim().to_owned(),
            delta,
        })
    }

    /// Returns the parsed length.
    #[must_use]
    pub const fn as_delta(&self) -> TimeDelta {
        self.delta
    }

    /// Returns the original text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for HumanDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
