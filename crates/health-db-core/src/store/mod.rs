//! Record store: the keyed collection of all patient records.
//!
//! Two backends implement [`RecordStore`]:
//!
//! - [`MemoryStore`]: in-process map with one mutex per record
//! - [`SqliteStore`]: durable, one row per patient document
//!
//! Every mutation of a given id (`create`, `append_test`) is serialized, so a
//! reader never sees a half-applied append and two concurrent appends to the
//! same patient both land.
//!
//! Both backends iterate in insertion order. Overwriting an existing id keeps
//! the record's original position.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};
use crate::db::DbError;
use crate::models::PatientRecord;

/// Default upper bound on how long an operation waits for a record lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Patient ID {0} not found in database")]
    NotFound(i64),

    #[error("Patient ID {0} already exists in database")]
    DuplicateId(i64),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Timed out waiting for lock on {0}")]
    LockTimeout(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl StoreError {
    /// Errors caused by caller input, as opposed to storage failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_) | StoreError::DuplicateId(_) | StoreError::InvalidRecord(_)
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What `create` does when the id is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with `StoreError::DuplicateId`
    #[default]
    Reject,
    /// Replace the existing record, dropping its tests
    Overwrite,
}

/// Keyed collection of patient records.
///
/// Records handed out by the store are snapshots; the only way to change a
/// stored record is through the store itself.
pub trait RecordStore: Send + Sync {
    /// Create a record with no tests.
    fn create(&self, name: &str, id: i64, blood_type: &str) -> StoreResult<PatientRecord> {
        self.create_with_age(name, id, blood_type, None)
    }

    /// Create a record with no tests and an optional age.
    fn create_with_age(
        &self,
        name: &str,
        id: i64,
        blood_type: &str,
        age: Option<u32>,
    ) -> StoreResult<PatientRecord>;

    /// Look up a record. A missing id is `Ok(None)`, not an error.
    fn find(&self, id: i64) -> StoreResult<Option<PatientRecord>>;

    /// Append a test result and return the updated record.
    fn append_test(&self, id: i64, test_name: &str, test_result: i64)
        -> StoreResult<PatientRecord>;

    /// Remove a record. Administrative; returns whether it existed.
    fn delete(&self, id: i64) -> StoreResult<bool>;

    /// Consistent copies of all records, in insertion order.
    fn snapshot(&self) -> StoreResult<Vec<PatientRecord>>;

    /// Number of stored records.
    fn len(&self) -> StoreResult<usize>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Build a new record after checking the caller-supplied fields.
pub(crate) fn new_record(
    name: &str,
    id: i64,
    blood_type: &str,
    age: Option<u32>,
) -> StoreResult<PatientRecord> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidRecord(
            "patient name must not be empty".into(),
        ));
    }
    Ok(PatientRecord::new(name.to_string(), id, blood_type.to_string()).with_age(age))
}

/// Open the store described by `config`.
pub fn open_store(config: &StorageConfig) -> StoreResult<Arc<dyn RecordStore>> {
    let policy = config.duplicate_policy;
    let timeout = config.lock_timeout();

    let store: Arc<dyn RecordStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::with_options(policy, timeout)),
        StorageBackend::Sqlite => match &config.path {
            Some(path) => Arc::new(SqliteStore::open(path, policy, timeout)?),
            None => Arc::new(SqliteStore::open_in_memory_with(policy, timeout)?),
        },
    };
    Ok(store)
}
