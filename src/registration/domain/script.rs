//! Script parameters carried by register and update jobs.

use super::RegistrationDomainError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LENGTH: usize = 64;

/// SHA-256 digest of a script body, stored as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScriptDigest(String);

impl ScriptDigest {
    /// Computes the digest of a script body.
    #[must_use]
    pub fn of(content: impl AsRef<[u8]>) -> Self {
        let hash = Sha256::digest(content.as_ref());
        Self(hash.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// Parses a previously rendered digest.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationDomainError::InvalidDigest`] unless the value is
    /// exactly 64 lowercase hexadecimal characters.
    pub fn from_hex(value: impl Into<String>) -> Result<Self, RegistrationDomainError> {
        let hex = value.into();
        let is_valid = hex.len() == DIGEST_HEX_LENGTH
            && hex
                .chars()
                .all(|character| character.is_ascii_digit() || ('a'..='f').contains(&character));
        if !is_valid {
            return Err(RegistrationDomainError::InvalidDigest(hex));
        }
        Ok(Self(hex))
    }

    /// Returns the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ScriptDigest {
    type Error = RegistrationDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(value)
    }
}

impl From<ScriptDigest> for String {
    fn from(value: ScriptDigest) -> Self {
        value.0
    }
}

impl fmt::Display for ScriptDigest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Script location and content identity for a registration.
///
/// Two sources are equal only when both the URL and the content digest
/// match, which is what keeps register jobs for different content from
/// being coalesced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptSource {
    script_url: String,
    digest: ScriptDigest,
}

impl ScriptSource {
    /// Creates a script source from a URL and the script body.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationDomainError`] when the URL is empty or contains
    /// whitespace.
    pub fn new(
        script_url: impl Into<String>,
        content: impl AsRef<[u8]>,
    ) -> Result<Self, RegistrationDomainError> {
        Self::with_digest(script_url, ScriptDigest::of(content))
    }

    /// Creates a script source from a URL and a precomputed digest.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationDomainError`] when the URL is empty or contains
    /// whitespace.
    pub fn with_digest(
        script_url: impl Into<String>,
        digest: ScriptDigest,
    ) -> Result<Self, RegistrationDomainError> {
        let url = script_url.into().trim().to_owned();
        if url.is_empty() {
            return Err(RegistrationDomainError::EmptyScriptUrl);
        }
        if url
            .chars()
            .any(|character| character.is_whitespace() || character.is_control())
        {
            return Err(RegistrationDomainError::InvalidScriptUrl(url));
        }
        Ok(Self {
            script_url: url,
            digest,
        })
    }

    /// Returns the script URL.
    #[must_use]
    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    /// Returns the content digest.
    #[must_use]
    pub const fn digest(&self) -> &ScriptDigest {
        &self.digest
    }
}

impl fmt::Display for ScriptSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}@{}", self.script_url, self.digest)
    }
}
