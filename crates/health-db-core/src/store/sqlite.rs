//! SQLite-backed record store.

use std::path::Path;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use super::{new_record, DuplicatePolicy, RecordStore, StoreError, StoreResult, DEFAULT_LOCK_TIMEOUT};
use crate::db::{self, Database, DbError};
use crate::models::{PatientRecord, TestResult};

/// Durable store keeping one row per patient.
///
/// A single connection sits behind a mutex; every read-modify-write runs in
/// one SQLite transaction while that mutex is held.
pub struct SqliteStore {
    db: Mutex<Database>,
    policy: DuplicatePolicy,
    lock_timeout: Duration,
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open<P: AsRef<Path>>(
        path: P,
        policy: DuplicatePolicy,
        lock_timeout: Duration,
    ) -> StoreResult<Self> {
        Ok(Self::from_database(Database::open(path)?, policy, lock_timeout))
    }

    /// In-memory SQLite database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_in_memory_with(DuplicatePolicy::default(), DEFAULT_LOCK_TIMEOUT)
    }

    pub fn open_in_memory_with(
        policy: DuplicatePolicy,
        lock_timeout: Duration,
    ) -> StoreResult<Self> {
        Ok(Self::from_database(
            Database::open_in_memory()?,
            policy,
            lock_timeout,
        ))
    }

    /// Wrap an already opened database.
    pub fn from_database(db: Database, policy: DuplicatePolicy, lock_timeout: Duration) -> Self {
        Self {
            db: Mutex::new(db),
            policy,
            lock_timeout,
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Database>> {
        self.db
            .try_lock_for(self.lock_timeout)
            .ok_or_else(|| StoreError::LockTimeout("patient database".into()))
    }
}

impl RecordStore for SqliteStore {
    fn create_with_age(
        &self,
        name: &str,
        id: i64,
        blood_type: &str,
        age: Option<u32>,
    ) -> StoreResult<PatientRecord> {
        let record = new_record(name, id, blood_type, age)?;

        let mut guard = self.lock()?;
        let tx = guard.transaction()?;

        let exists = db::patient_exists(&tx, id)?;
        if exists && self.policy == DuplicatePolicy::Reject {
            return Err(StoreError::DuplicateId(id));
        }
        db::insert_patient(&tx, &record, exists)?;
        tx.commit().map_err(DbError::from)?;

        Ok(record)
    }

    fn find(&self, id: i64) -> StoreResult<Option<PatientRecord>> {
        Ok(self.lock()?.get_patient(id)?)
    }

    fn append_test(
        &self,
        id: i64,
        test_name: &str,
        test_result: i64,
    ) -> StoreResult<PatientRecord> {
        let mut guard = self.lock()?;
        let tx = guard.transaction()?;

        let mut record = db::get_patient(&tx, id)?.ok_or(StoreError::NotFound(id))?;
        record.push_test(TestResult::new(test_name, test_result));
        db::update_patient_tests(&tx, id, &record.tests, &record.updated_at)?;
        tx.commit().map_err(DbError::from)?;

        Ok(record)
    }

    fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.lock()?.delete_patient(id)?)
    }

    fn snapshot(&self) -> StoreResult<Vec<PatientRecord>> {
        Ok(self.lock()?.list_patients()?)
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.count_patients()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_find() {
        let store = SqliteStore::open_in_memory().unwrap();
        let created = store.create_with_age("David", 1, "O+", Some(34)).unwrap();

        let found = store.find(1).unwrap().unwrap();
        assert_eq!(found, created);
        assert!(store.find(2).unwrap().is_none());
    }

    #[test]
    fn test_append_persists_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create("David", 1, "O+").unwrap();
        store.append_test(1, "HDL", 65).unwrap();
        let updated = store.append_test(1, "LDL", 130).unwrap();

        let expected = vec![TestResult::new("HDL", 65), TestResult::new("LDL", 130)];
        assert_eq!(updated.tests, expected);
        assert_eq!(store.find(1).unwrap().unwrap().tests, expected);
    }

    #[test]
    fn test_append_missing() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(
            store.append_test(999, "HDL", 65),
            Err(StoreError::NotFound(999))
        ));
    }

    #[test]
    fn test_duplicate_policies() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create("David", 1, "O+").unwrap();
        assert!(matches!(
            store.create("Dana", 1, "A-"),
            Err(StoreError::DuplicateId(1))
        ));

        let store =
            SqliteStore::open_in_memory_with(DuplicatePolicy::Overwrite, DEFAULT_LOCK_TIMEOUT)
                .unwrap();
        store.create("David", 1, "O+").unwrap();
        store.append_test(1, "HDL", 65).unwrap();
        store.create("Dana", 1, "A-").unwrap();

        let found = store.find(1).unwrap().unwrap();
        assert_eq!(found.name, "Dana");
        assert!(found.tests.is_empty());
    }

    #[test]
    fn test_lock_timeout() {
        let store = SqliteStore::open_in_memory_with(
            DuplicatePolicy::Reject,
            Duration::from_millis(10),
        )
        .unwrap();

        let _held = store.db.lock();
        let err = store.find(1).unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout(_)));
        assert_eq!(
            err.to_string(),
            "Timed out waiting for lock on patient database"
        );
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("health.db");

        {
            let store = SqliteStore::open(&path, DuplicatePolicy::Reject, DEFAULT_LOCK_TIMEOUT)
                .unwrap();
            store.create("David", 1, "O+").unwrap();
            store.append_test(1, "HDL", 65).unwrap();
        }

        let store =
            SqliteStore::open(&path, DuplicatePolicy::Reject, DEFAULT_LOCK_TIMEOUT).unwrap();
        let found = store.find(1).unwrap().unwrap();
        assert_eq!(found.tests, vec![TestResult::new("HDL", 65)]);
    }
}
