//! Error types for registration domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing registration domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationDomainError {
    /// The scope key is empty after trimming.
    #[error("scope key must not be empty")]
    EmptyScope,

    /// The scope key contains whitespace or control characters.
    #[error("scope key '{0}' contains whitespace or control characters")]
    InvalidScope(String),

    /// The scope key exceeds the 2048-byte limit.
    #[error("scope key exceeds 2048 byte limit: {0}")]
    ScopeTooLong(String),

    /// The script URL is empty after trimming.
    #[error("script URL must not be empty")]
    EmptyScriptUrl,

    /// The script URL contains whitespace or control characters.
    #[error("script URL '{0}' contains whitespace or control characters")]
    InvalidScriptUrl(String),

    /// A persisted digest is not 64 lowercase hexadecimal characters.
    #[error("invalid script digest: {0}")]
    InvalidDigest(String),
}

/// Error returned while parsing a job kind from its canonical name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown registration job kind: {0}")]
pub struct ParseJobKindError(pub String);

/// Error returned while parsing a job status from its canonical name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown registration job status: {0}")]
pub struct ParseJobStatusError(pub String);
