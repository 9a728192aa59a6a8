//! Per-invocation plugin settings.

use super::{FieldError, SettingsError};
use crate::assignment::domain::{CommandName, DurationUnit, HumanDuration, Role, TaskLimit};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const DEFAULT_MEMBER_LIMIT: u32 = 10;
const DEFAULT_CONTRIBUTOR_LIMIT: u32 = 2;

/// Text posted when a contributor without a wallet tries to start.
pub const DEFAULT_EMPTY_WALLET_TEXT: &str =
    "Please set your wallet address with the /wallet command first and try again.";

/// Concurrency limits keyed by lower-cased role name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, TaskLimit>")]
pub struct RoleLimits(BTreeMap<String, TaskLimit>);

impl RoleLimits {
    /// Creates limits from `(role, limit)` pairs.
    pub fn new<I, S>(limits: I) -> Self
    where
        I: IntoIterator<Item = (S, TaskLimit)>,
        S: AsRef<str>,
    {
        Self(
            limits
                .into_iter()
                .map(|(role, limit)| (role.as_ref().trim().to_ascii_lowercase(), limit))
                .collect(),
        )
    }

    /// Returns the limit for `role`.
    ///
    /// Known tiers use their own key; an unrecognised role such as
    /// `billing_manager` is looked up by its lower-cased name. Roles without
    /// an entry get the smallest configured limit.
    #[must_use]
    pub fn limit_for(&self, role: &Role) -> TaskLimit {
        let configured = match role {
            Role::Unrecognized(raw) => self.0.get(&raw.trim().to_ascii_lowercase()),
            known => known.config_key().and_then(|key| self.0.get(key)),
        };
        configured.copied().unwrap_or_else(|| self.smallest())
    }

    /// Returns the smallest configured limit, or [`TaskLimit::Unlimited`]
    /// when none is configured.
    #[must_use]
    pub fn smallest(&self) -> TaskLimit {
        self.0
            .values()
            .copied()
            .min()
            .unwrap_or(TaskLimit::Unlimited)
    }

    /// Iterates over `(role, limit)` entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TaskLimit)> {
        self.0.iter().map(|(role, limit)| (role.as_str(), *limit))
    }
}

impl From<BTreeMap<String, TaskLimit>> for RoleLimits {
    fn from(limits: BTreeMap<String, TaskLimit>) -> Self {
        Self::new(limits)
    }
}

impl Default for RoleLimits {
    fn default() -> Self {
        Self::new([
            ("admin", TaskLimit::Unlimited),
            ("member", TaskLimit::Limited(DEFAULT_MEMBER_LIMIT)),
            ("contributor", TaskLimit::Limited(DEFAULT_CONTRIBUTOR_LIMIT)),
        ])
    }
}

/// Validated settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartStopSettings {
    /// Age after which an unreviewed pull request stops counting as load.
    pub review_delay_tolerance: HumanDuration,
    /// Issue age after which assignees are warned the task may be stale.
    pub task_stale_timeout_duration: HumanDuration,
    /// Whether starting requires a registered wallet.
    pub start_requires_wallet: bool,
    /// Concurrency limit per role.
    pub max_concurrent_tasks: RoleLimits,
    /// Comment posted when the wallet is missing.
    pub empty_wallet_text: String,
    /// Review author associations whose approval frees a pull request,
    /// upper-cased.
    pub roles_with_review_authority: Vec<String>,
    /// Lower-cased command words that are switched off.
    pub disabled_commands: Vec<String>,
}

impl Default for StartStopSettings {
    fn default() -> Self {
        Self {
            review_delay_tolerance: HumanDuration::new(1, DurationUnit::Day),
            task_stale_timeout_duration: HumanDuration::new(30, DurationUnit::Day),
            start_requires_wallet: true,
            max_concurrent_tasks: RoleLimits::default(),
            empty_wallet_text: DEFAULT_EMPTY_WALLET_TEXT.to_owned(),
            roles_with_review_authority: ["COLLABORATOR", "OWNER", "MEMBER"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            disabled_commands: Vec::new(),
        }
    }
}

impl StartStopSettings {
    /// Decodes settings from JSON, filling absent keys with defaults.
    ///
    /// `null` is treated as an empty object. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] listing every field that failed to decode.
    pub fn from_value(value: &Value) -> Result<Self, SettingsError> {
        let empty = Map::new();
        let object = match value {
            Value::Null => &empty,
            Value::Object(object) => object,
            _ => {
                return Err(SettingsError::single(FieldError::new(
                    "",
                    "settings must be an object",
                )));
            }
        };

        let mut errors = Vec::new();
        let mut settings = Self::default();
        if let Some(decoded) = decode_field(object, "reviewDelayTolerance", &mut errors) {
            settings.review_delay_tolerance = decoded;
        }
        if let Some(decoded) = decode_field(object, "taskStaleTimeoutDuration", &mut errors) {
            settings.task_stale_timeout_duration = decoded;
        }
        if let Some(decoded) = decode_field(object, "startRequiresWallet", &mut errors) {
            settings.start_requires_wallet = decoded;
        }
        if let Some(decoded) = decode_field(object, "maxConcurrentTasks", &mut errors) {
            settings.max_concurrent_tasks = decoded;
        }
        if let Some(decoded) = decode_field(object, "emptyWalletText", &mut errors) {
            settings.empty_wallet_text = decoded;
        }
        if let Some(roles) =
            decode_field::<Vec<String>>(object, "rolesWithReviewAuthority", &mut errors)
        {
            settings.roles_with_review_authority = roles
                .iter()
                .map(|role| role.trim().to_ascii_uppercase())
                .collect();
        }
        if let Some(commands) =
            decode_field::<Vec<String>>(object, "disabledCommands", &mut errors)
        {
            settings.disabled_commands = commands
                .iter()
                .map(String::as_str)
                .map(normalize_command)
                .collect();
        }

        match SettingsError::from_errors(errors) {
            Some(error) => Err(error),
            None => Ok(settings),
        }
    }

    /// Returns whether `command` is switched off for this repository.
    #[must_use]
    pub fn is_command_disabled(&self, command: CommandName) -> bool {
        self.disabled_commands
            .iter()
            .any(|disabled| disabled == command.as_str())
    }
}

fn normalize_command(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('/')
        .unwrap_or(trimmed)
        .to_ascii_lowercase()
}

fn decode_field<T: DeserializeOwned>(
    object: &Map<String, Value>,
    key: &str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    let raw = object.get(key)?;
    match T::deserialize(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(FieldError::new(format!("/{key}"), err.to_string()));
            None
        }
    }
}
