//! SQLite schema definition.

/// Complete database schema for health-db.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients (one row per patient document)
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,       -- insertion order
    id INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    blood_type TEXT NOT NULL,
    age INTEGER CHECK (age IS NULL OR age >= 0),
    tests TEXT NOT NULL DEFAULT '[]',            -- JSON array of [test_name, test_result]
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_age ON patients(age);
"#;
