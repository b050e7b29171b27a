//! JSON-document storage for scope registrations.

use super::blocking::run_blocking;
use crate::registration::{
    domain::{RegistrationRecord, ScopeKey},
    ports::{RegistrationStorage, RegistrationStorageError, RegistrationStorageResult},
};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use sha2::{Digest, Sha256};
use std::io;
use std::sync::Arc;
use thiserror::Error;

const DOCUMENT_EXTENSION: &str = "json";
const STAGING_EXTENSION: &str = "json.tmp";

/// Registration storage writing one JSON document per scope.
///
/// Document names are the SHA-256 of the scope key, so arbitrary scope
/// strings never reach the filesystem as paths. Writes go to a staging file
/// first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileRegistrationStorage {
    dir: Arc<Dir>,
}

/// A stored document does not belong to the scope it was looked up under.
#[derive(Debug, Error)]
#[error("document for scope {expected} holds registration for {found}")]
struct ScopeMismatch {
    expected: ScopeKey,
    found: ScopeKey,
}

impl FileRegistrationStorage {
    /// Opens storage rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationStorageError::Persistence`] when the directory
    /// cannot be created or opened.
    pub fn open(root: impl AsRef<Utf8Path>) -> RegistrationStorageResult<Self> {
        let path = root.as_ref();
        Dir::create_ambient_dir_all(path, ambient_authority())
            .map_err(RegistrationStorageError::persistence)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(RegistrationStorageError::persistence)?;
        Ok(Self::from_dir(dir))
    }

    /// Wraps an already opened directory capability.
    #[must_use]
    pub fn from_dir(dir: Dir) -> Self {
        Self { dir: Arc::new(dir) }
    }
}

fn document_name(scope: &ScopeKey, extension: &str) -> Utf8PathBuf {
    let hash = Sha256::digest(scope.as_str().as_bytes());
    let stem: String = hash.iter().map(|byte| format!("{byte:02x}")).collect();
    Utf8PathBuf::from(format!("{stem}.{extension}"))
}

fn read_document(dir: &Dir, name: &Utf8Path) -> RegistrationStorageResult<Option<RegistrationRecord>> {
    let contents = match dir.read_to_string(name) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(RegistrationStorageError::persistence(err)),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(RegistrationStorageError::invalid_persisted_data)
}

fn ensure_scope(
    expected: &ScopeKey,
    record: Option<RegistrationRecord>,
) -> RegistrationStorageResult<Option<RegistrationRecord>> {
    match record {
        Some(found) if found.scope() != expected => Err(
            RegistrationStorageError::invalid_persisted_data(ScopeMismatch {
                expected: expected.clone(),
                found: found.scope().clone(),
            }),
        ),
        other => Ok(other),
    }
}

#[async_trait]
impl RegistrationStorage for FileRegistrationStorage {
    async fn find_by_scope(
        &self,
        scope: &ScopeKey,
    ) -> RegistrationStorageResult<Option<RegistrationRecord>> {
        let dir = Arc::clone(&self.dir);
        let expected = scope.clone();
        run_blocking(move || {
            let name = document_name(&expected, DOCUMENT_EXTENSION);
            ensure_scope(&expected, read_document(&dir, &name)?)
        })
        .await
    }

    async fn store(&self, record: &RegistrationRecord) -> RegistrationStorageResult<()> {
        let dir = Arc::clone(&self.dir);
        let payload = serde_json::to_vec_pretty(record)
            .map_err(RegistrationStorageError::invalid_persisted_data)?;
        let scope = record.scope().clone();
        run_blocking(move || {
            let staging = document_name(&scope, STAGING_EXTENSION);
            let target = document_name(&scope, DOCUMENT_EXTENSION);
            dir.write(&staging, payload)
                .map_err(RegistrationStorageError::persistence)?;
            dir.rename(&staging, &dir, &target)
                .map_err(RegistrationStorageError::persistence)
        })
        .await
    }

    async fn delete(&self, scope: &ScopeKey) -> RegistrationStorageResult<()> {
        let dir = Arc::clone(&self.dir);
        let target_scope = scope.clone();
        run_blocking(move || {
            let name = document_name(&target_scope, DOCUMENT_EXTENSION);
            match dir.remove_file(&name) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    Err(RegistrationStorageError::NotFound(target_scope))
                }
                Err(err) => Err(RegistrationStorageError::persistence(err)),
            }
        })
        .await
    }

    async fn list_all(&self) -> RegistrationStorageResult<Vec<RegistrationRecord>> {
        let dir = Arc::clone(&self.dir);
        run_blocking(move || {
            let mut records = Vec::new();
            let entries = dir.entries().map_err(RegistrationStorageError::persistence)?;
            for entry in entries {
                let file_name = entry
                    .map_err(RegistrationStorageError::persistence)?
                    .file_name()
                    .map_err(RegistrationStorageError::persistence)?;
                let name = Utf8PathBuf::from(file_name);
                if name.extension() != Some(DOCUMENT_EXTENSION) {
                    continue;
                }
                if let Some(record) = read_document(&dir, &name)? {
                    records.push(record);
                }
            }
            records.sort_by(|left, right| left.scope().cmp(right.scope()));
            Ok(records)
        })
        .await
    }
}
