//! Job kinds and the requests the coordinator schedules.

use super::{ParseJobKindError, ScopeKey, ScriptSource};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutation class performed by a registration job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Create or replace the registration for a scope.
    Register,
    /// Refresh an existing registration.
    Update,
    /// Remove the registration for a scope.
    Unregister,
}

impl JobKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Update => "update",
            Self::Unregister => "unregister",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobKind {
    type Error = ParseJobKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "register" => Ok(Self::Register),
            "update" => Ok(Self::Update),
            "unregister" => Ok(Self::Unregister),
            _ => Err(ParseJobKindError(value.to_owned())),
        }
    }
}

/// A mutating request against the registry for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobRequest {
    /// Create the registration, or replace it when the script differs.
    Register {
        /// Target scope.
        scope: ScopeKey,
        /// Script to register.
        script: ScriptSource,
    },
    /// Point an existing registration at a new script.
    Update {
        /// Target scope.
        scope: ScopeKey,
        /// Script the registration should serve.
        script: ScriptSource,
    },
    /// Remove the registration, succeeding when none exists.
    Unregister {
        /// Target scope.
        scope: ScopeKey,
    },
}

impl JobRequest {
    /// Creates a register request.
    #[must_use]
    pub const fn register(scope: ScopeKey, script: ScriptSource) -> Self {
        Self::Register { scope, script }
    }

    /// Creates an update request.
    #[must_use]
    pub const fn update(scope: ScopeKey, script: ScriptSource) -> Self {
        Self::Update { scope, script }
    }

    /// Creates an unregister request.
    #[must_use]
    pub const fn unregister(scope: ScopeKey) -> Self {
        Self::Unregister { scope }
    }

    /// Returns the mutation class of the request.
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        match self {
            Self::Register { .. } => JobKind::Register,
            Self::Update { .. } => JobKind::Update,
            Self::Unregister { .. } => JobKind::Unregister,
        }
    }

    /// Returns the scope the request targets.
    #[must_use]
    pub const fn scope(&self) -> &ScopeKey {
        match self {
            Self::Register { scope, .. } | Self::Update { scope, .. } | Self::Unregister { scope } => {
                scope
            }
        }
    }

    /// Returns the script parameters, if the kind carries any.
    #[must_use]
    pub const fn script(&self) -> Option<&ScriptSource> {
        match self {
            Self::Register { script, .. } | Self::Update { script, .. } => Some(script),
            Self::Unregister { .. } => None,
        }
    }

    /// Returns `true` when `other` can share this request's job.
    ///
    /// Requests are equivalent when they have the same kind and scope and,
    /// for kinds with parameters, the same script source.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unregister { scope: left }, Self::Unregister { scope: right }) => left == right,
            (
                Self::Register {
                    scope: left,
                    script: left_script,
                },
                Self::Register {
                    scope: right,
                    script: right_script,
                },
            )
            | (
                Self::Update {
                    scope: left,
                    script: left_script,
                },
                Self::Update {
                    scope: right,
                    script: right_script,
                },
            ) => left == right && left_script == right_script,
            _ => false,
        }
    }
}

impl fmt::Display for JobRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.scope())
    }
}
