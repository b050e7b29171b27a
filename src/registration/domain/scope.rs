//! Validated scope key partitioning the registry.

use super::RegistrationDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a scope key in bytes.
const MAX_SCOPE_LENGTH: usize = 2048;

/// Scope key under which registration jobs are ordered and exclusive.
///
/// Keys are opaque to the coordinator; typically they hold a canonical URL
/// prefix such as `https://example.com/app/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScopeKey(String);

impl ScopeKey {
    /// Creates a validated scope key.
    ///
    /// The input is trimmed. Interior whitespace and control characters are
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, RegistrationDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(RegistrationDomainError::EmptyScope);
        }

        if trimmed
            .chars()
            .any(|character| character.is_whitespace() || character.is_control())
        {
            return Err(RegistrationDomainError::InvalidScope(trimmed.to_owned()));
        }

        if trimmed.len() > MAX_SCOPE_LENGTH {
            return Err(RegistrationDomainError::ScopeTooLong(trimmed.to_owned()));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the scope key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ScopeKey {
    type Error = RegistrationDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScopeKey> for String {
    fn from(value: ScopeKey) -> Self {
        value.0
    }
}

impl AsRef<str> for ScopeKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
