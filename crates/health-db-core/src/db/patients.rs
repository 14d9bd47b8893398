//! Patient database operations.

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{PatientRecord, TestResult};

const PATIENT_COLUMNS: &str =
    "id, name, blood_type, age, tests, created_at, updated_at";

impl Database {
    /// Get a patient by id.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<PatientRecord>> {
        get_patient(&self.conn, id)
    }

    /// List all patients in insertion order.
    pub fn list_patients(&self) -> DbResult<Vec<PatientRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY seq"))?;

        let rows = stmt.query_map([], PatientRow::from_row)?;

        let mut patients: Vec<PatientRecord> = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// Count stored patients.
    pub fn count_patients(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Delete a patient.
    pub fn delete_patient(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

// Free functions take a `Connection` so they also run inside a
// `Transaction` (which derefs to `Connection`).

pub(crate) fn insert_patient(
    conn: &Connection,
    patient: &PatientRecord,
    replace: bool,
) -> DbResult<()> {
    let tests_json = serde_json::to_string(&patient.tests)?;
    // An upsert updates the row in place, keeping its `seq` position.
    let on_conflict = if replace {
        " ON CONFLICT(id) DO UPDATE SET name = excluded.name, \
         blood_type = excluded.blood_type, age = excluded.age, tests = excluded.tests, \
         created_at = excluded.created_at, updated_at = excluded.updated_at"
    } else {
        ""
    };

    conn.execute(
        &format!(
            "INSERT INTO patients ({PATIENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7){on_conflict}"
        ),
        params![
            patient.id,
            patient.name,
            patient.blood_type,
            patient.age,
            tests_json,
            patient.created_at,
            patient.updated_at,
        ],
    )
    .map_err(constraint_error)?;
    Ok(())
}

pub(crate) fn get_patient(conn: &Connection, id: i64) -> DbResult<Option<PatientRecord>> {
    conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?"),
        [id],
        PatientRow::from_row,
    )
    .optional()?
    .map(|row| row.try_into())
    .transpose()
}

pub(crate) fn patient_exists(conn: &Connection, id: i64) -> DbResult<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM patients WHERE id = ?", [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn update_patient_tests(
    conn: &Connection,
    id: i64,
    tests: &[TestResult],
    updated_at: &str,
) -> DbResult<bool> {
    let tests_json = serde_json::to_string(tests)?;
    let rows_affected = conn.execute(
        "UPDATE patients SET tests = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, tests_json, updated_at],
    )?;
    Ok(rows_affected > 0)
}

fn constraint_error(e: rusqlite::Error) -> DbError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, ref msg)
            if err.code == ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(msg.clone().unwrap_or_else(|| err.to_string()))
        }
        other => DbError::Sqlite(other),
    }
}

/// Internal row type for database mapping.
struct PatientRow {
    id: i64,
    name: String,
    blood_type: String,
    age: Option<u32>,
    tests: String,
    created_at: String,
    updated_at: String,
}

impl PatientRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            blood_type: row.get(2)?,
            age: row.get(3)?,
            tests: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl TryFrom<PatientRow> for PatientRecord {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        Ok(PatientRecord {
            id: row.id,
            name: row.name,
            blood_type: row.blood_type,
            age: row.age,
            tests: serde_json::from_str(&row.tests)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
