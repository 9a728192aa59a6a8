//! Plugin settings and environment.
//!
//! Settings arrive with every invocation as camelCase JSON and are decoded
//! field by field so a single request reports every invalid value at once.

mod env;
mod error;
mod settings;

pub use env::{EnvValues, PluginEnv};
pub use error::{FieldError, SettingsError};
pub use settings::{DEFAULT_EMPTY_WALLET_TEXT, RoleLimits, StartStopSettings};
