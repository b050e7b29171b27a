//! Durable registration record stored per scope.

use super::{RegistrationId, ScopeKey, ScriptSource};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Registration stored by the backend for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    id: RegistrationId,
    scope: ScopeKey,
    script: ScriptSource,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RegistrationRecord {
    /// Creates the first version of a registration for `scope`.
    #[must_use]
    pub fn new(scope: ScopeKey, script: ScriptSource, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: RegistrationId::new(),
            scope,
            script,
            version: 1,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the successor of this record pointing at `script`.
    ///
    /// The identifier and creation time are kept; the version is bumped and
    /// the update timestamp refreshed.
    #[must_use]
    pub fn replaced_with(&self, script: ScriptSource, clock: &impl Clock) -> Self {
        Self {
            id: self.id,
            scope: self.scope.clone(),
            script,
            version: self.version.saturating_add(1),
            created_at: self.created_at,
            updated_at: clock.utc(),
        }
    }

    /// Returns `true` when the record already points at `script`.
    #[must_use]
    pub fn serves(&self, script: &ScriptSource) -> bool {
        self.script == *script
    }

    /// Returns the registration identifier.
    #[must_use]
    pub const fn id(&self) -> RegistrationId {
        self.id
    }

    /// Returns the scope key.
    #[must_use]
    pub const fn scope(&self) -> &ScopeKey {
        &self.scope
    }

    /// Returns the registered script source.
    #[must_use]
    pub const fn script(&self) -> &ScriptSource {
        &self.script
    }

    /// Returns the registration version, starting at 1.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
