//! Validation errors for plugin settings and environment.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single invalid field, addressed by a JSON pointer such as
/// `/reviewDelayTolerance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// JSON pointer to the offending value.
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every field that failed validation in one decode pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid configuration ({} field error(s))", .errors.len())]
pub struct SettingsError {
    errors: Vec<FieldError>,
}

impl SettingsError {
    /// Wraps a non-empty list of field errors.
    ///
    /// Returns `None` when `errors` is empty.
    #[must_use]
    pub fn from_errors(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// Wraps a single field error.
    #[must_use]
    pub fn single(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Returns the field errors.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Appends the errors of `other`.
    pub fn merge(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }
}
