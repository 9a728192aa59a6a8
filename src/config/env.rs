//! Secrets and endpoints the plugin needs at run time.

use super::{FieldError, SettingsError};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

const SUPABASE_URL_KEY: &str = "SUPABASE_URL";
const SUPABASE_KEY_KEY: &str = "SUPABASE_KEY";

/// Environment values that may be supplied by the process or per request.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvValues {
    /// Base URL of the wallet database's REST endpoint.
    #[serde(rename = "SUPABASE_URL", default)]
    pub supabase_url: Option<String>,
    /// API key for the wallet database.
    #[serde(rename = "SUPABASE_KEY", default)]
    pub supabase_key: Option<String>,
}

impl EnvValues {
    /// Returns these values with gaps filled from `fallback`.
    #[must_use]
    pub fn or(self, fallback: &Self) -> Self {
        Self {
            supabase_url: self.supabase_url.or_else(|| fallback.supabase_url.clone()),
            supabase_key: self.supabase_key.or_else(|| fallback.supabase_key.clone()),
        }
    }
}

impl fmt::Debug for EnvValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvValues")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &self.supabase_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Validated environment for one invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct PluginEnv {
    supabase_url: Url,
    supabase_key: String,
}

impl PluginEnv {
    /// Creates a validated environment.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the URL does not parse or the key is
    /// empty.
    pub fn new(supabase_url: &str, supabase_key: &str) -> Result<Self, SettingsError> {
        Self::validate(EnvValues {
            supabase_url: Some(supabase_url.to_owned()),
            supabase_key: Some(supabase_key.to_owned()),
        })
    }

    /// Decodes the per-request `env` object and fills missing keys from
    /// `defaults`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] listing every missing or invalid key.
    pub fn resolve(
        request_env: Option<&Value>,
        defaults: &EnvValues,
    ) -> Result<Self, SettingsError> {
        let provided = match request_env {
            None | Some(Value::Null) => EnvValues::default(),
            Some(raw) => EnvValues::deserialize(raw)
                .map_err(|err| SettingsError::single(FieldError::new("/env", err.to_string())))?,
        };
        Self::validate(provided.or(defaults))
    }

    fn validate(values: EnvValues) -> Result<Self, SettingsError> {
        let mut errors = Vec::new();
        let supabase_url = match values.supabase_url.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push(FieldError::new(
                    format!("/{SUPABASE_URL_KEY}"),
                    "expected a non-empty string",
                ));
                None
            }
            Some(raw) => match Url::parse(raw) {
                Ok(url) => Some(url),
                Err(err) => {
                    errors.push(FieldError::new(
                        format!("/{SUPABASE_URL_KEY}"),
                        format!("invalid URL: {err}"),
                    ));
                    None
                }
            },
        };
        let supabase_key = values
            .supabase_key
            .map(|key| key.trim().to_owned())
            .filter(|key| !key.is_empty());
        if supabase_key.is_none() {
            errors.push(FieldError::new(
                format!("/{SUPABASE_KEY_KEY}"),
                "expected a non-empty string",
            ));
        }

        match (supabase_url, supabase_key, SettingsError::from_errors(errors)) {
            (Some(url), Some(key), None) => Ok(Self {
                supabase_url: url,
                supabase_key: key,
            }),
            (_, _, Some(error)) => Err(error),
            _ => Err(SettingsError::single(FieldError::new(
                "/env",
                "incomplete environment",
            ))),
        }
    }

    /// Returns the wallet database's REST base URL.
    #[must_use]
    pub const fn supabase_url(&self) -> &Url {
        &self.supabase_url
    }

    /// Returns the wallet database API key.
    #[must_use]
    pub fn supabase_key(&self) -> &str {
        &self.supabase_key
    }
}

impl fmt::Debug for PluginEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginEnv")
            .field("supabase_url", &self.supabase_url.as_str())
            .field("supabase_key", &"<redacted>")
            .finish()
    }
}
