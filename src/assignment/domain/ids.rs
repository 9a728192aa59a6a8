//! Identifier and validated scalar types for the assignment domain.

use super::AssignmentDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Positive issue or pull request number on a tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueNumber(u64);

impl IssueNumber {
    /// Creates a validated issue number.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::InvalidIssueNumber`] when the value
    /// is zero.
    pub const fn new(value: u64) -> Result<Self, AssignmentDomainError> {
        if value == 0 {
            return Err(AssignmentDomainError::InvalidIssueNumber(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Repository on the tracker, split into its owner (organisation or user)
/// and repository name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    owner: String,
    name: String,
}

impl RepositoryRef {
    /// Creates a validated repository reference.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::InvalidRepository`] when either
    /// segment is empty or contains a slash or whitespace.
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, AssignmentDomainError> {
        let raw_owner = owner.into();
        let raw_name = name.into();
        let owner_value = raw_owner.trim();
        let name_value = raw_name.trim();
        if !is_valid_segment(owner_value) || !is_valid_segment(name_value) {
            return Err(AssignmentDomainError::InvalidRepository(format!(
                "{raw_owner}/{raw_name}"
            )));
        }
        Ok(Self {
            owner: owner_value.to_owned(),
            name: name_value.to_owned(),
        })
    }

    /// Parses an `owner/repo` full name.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::InvalidRepository`] when the value
    /// does not contain exactly two non-empty segments.
    pub fn from_full_name(full_name: &str) -> Result<Self, AssignmentDomainError> {
        let (owner, name) = full_name
            .trim()
            .split_once('/')
            .ok_or_else(|| AssignmentDomainError::InvalidRepository(full_name.to_owned()))?;
        Self::new(owner, name)
            .map_err(|_| AssignmentDomainError::InvalidRepository(full_name.to_owned()))
    }

    /// Extracts the repository from an item's HTML locator such as
    /// `https://github.com/owner/repo/pull/12`.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::InvalidRepository`] when the locator
    /// has no owner and repository path segments.
    pub fn from_html_url(html_url: &str) -> Result<Self, AssignmentDomainError> {
        let mut segments = html_url
            .split('/')
            .skip_while(|segment| !segment.contains('.'))
            .skip(1);
        let owner = segments.next().unwrap_or_default();
        let name = segments.next().unwrap_or_default();
        Self::new(owner, name)
            .map_err(|_| AssignmentDomainError::InvalidRepository(html_url.to_owned()))
    }

    /// Returns the owning organisation or user login.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn is_valid_segment(value: &str) -> bool {
    !value.is_empty() && !value.contains('/') && !value.chars().any(char::is_whitespace)
}

/// Issue (or pull request) addressed within its repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueLocator {
    repository: RepositoryRef,
    number: IssueNumber,
}

impl IssueLocator {
    /// Creates a locator from validated components.
    #[must_use]
    pub const fn new(repository: RepositoryRef, number: IssueNumber) -> Self {
        Self { repository, number }
    }

    /// Creates a locator from raw values.
    ///
    /// # Errors
    ///
    /// Returns an [`AssignmentDomainError`] when any component is invalid.
    pub fn from_parts(owner: &str, name: &str, number: u64) -> Result<Self, AssignmentDomainError> {
        Ok(Self::new(
            RepositoryRef::new(owner, name)?,
            IssueNumber::new(number)?,
        ))
    }

    /// Returns the repository.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryRef {
        &self.repository
    }

    /// Returns the issue number.
    #[must_use]
    pub const fn number(&self) -> IssueNumber {
        self.number
    }
}

impl fmt::Display for IssueLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repository, self.number)
    }
}

/// Account that triggered an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sender {
    /// Numeric tracker account identifier.
    pub id: u64,
    /// Account login.
    pub login: String,
}

impl Sender {
    /// Creates a sender.
    #[must_use]
    pub fn new(id: u64, login: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
        }
    }
}
