//! In-memory record store with per-record locking.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{new_record, DuplicatePolicy, RecordStore, StoreError, StoreResult, DEFAULT_LOCK_TIMEOUT};
use crate::models::{PatientRecord, TestResult};

type RecordCell = Arc<Mutex<PatientRecord>>;
type RecordIndex = IndexMap<i64, RecordCell>;

/// In-memory store.
///
/// The outer `RwLock` guards the key set only: `create` and `delete` take it
/// for writing, all other operations for reading. Each record sits behind
/// its own mutex, so appends to one patient never wait on another.
///
/// Records iterate in insertion order. Overwriting an id keeps its position.
pub struct MemoryStore {
    records: RwLock<RecordIndex>,
    policy: DuplicatePolicy,
    lock_timeout: Duration,
}

impl MemoryStore {
    /// Create an empty store that rejects duplicate ids.
    pub fn new() -> Self {
        Self::with_options(DuplicatePolicy::default(), DEFAULT_LOCK_TIMEOUT)
    }

    /// Create an empty store with an explicit duplicate policy and lock timeout.
    pub fn with_options(policy: DuplicatePolicy, lock_timeout: Duration) -> Self {
        Self {
            records: RwLock::new(IndexMap::new()),
            policy,
            lock_timeout,
        }
    }

    fn read_records(&self) -> StoreResult<RwLockReadGuard<'_, RecordIndex>> {
        self.records
            .try_read_for(self.lock_timeout)
            .ok_or_else(|| StoreError::LockTimeout("patient index".into()))
    }

    fn write_records(&self) -> StoreResult<RwLockWriteGuard<'_, RecordIndex>> {
        self.records
            .try_write_for(self.lock_timeout)
            .ok_or_else(|| StoreError::LockTimeout("patient index".into()))
    }

    fn lock_record<'a>(
        &self,
        id: i64,
        cell: &'a Mutex<PatientRecord>,
    ) -> StoreResult<MutexGuard<'a, PatientRecord>> {
        cell.try_lock_for(self.lock_timeout)
            .ok_or_else(|| StoreError::LockTimeout(format!("patient ID {}", id)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn create_with_age(
        &self,
        name: &str,
        id: i64,
        blood_type: &str,
        age: Option<u32>,
    ) -> StoreResult<PatientRecord> {
        let record = new_record(name, id, blood_type, age)?;

        let mut records = self.write_records()?;
        if records.contains_key(&id) && self.policy == DuplicatePolicy::Reject {
            return Err(StoreError::DuplicateId(id));
        }
        records.insert(id, Arc::new(Mutex::new(record.clone())));
        Ok(record)
    }

    fn find(&self, id: i64) -> StoreResult<Option<PatientRecord>> {
        let records = self.read_records()?;
        match records.get(&id) {
            Some(cell) => Ok(Some(self.lock_record(id, cell)?.clone())),
            None => Ok(None),
        }
    }

    fn append_test(
        &self,
        id: i64,
        test_name: &str,
        test_result: i64,
    ) -> StoreResult<PatientRecord> {
        // Keep the read guard for the whole update so a concurrent delete or
        // overwrite cannot detach the record we are appending to.
        let records = self.read_records()?;
        let cell = records.get(&id).ok_or(StoreError::NotFound(id))?;

        let mut record = self.lock_record(id, cell)?;
        record.push_test(TestResult::new(test_name, test_result));
        Ok(record.clone())
    }

    fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.write_records()?.shift_remove(&id).is_some())
    }

    fn snapshot(&self) -> StoreResult<Vec<PatientRecord>> {
        let records = self.read_records()?;
        records
            .iter()
            .map(|(id, cell)| self.lock_record(*id, cell).map(|record| record.clone()))
            .collect()
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.read_records()?.len())
    }
}
