//! Health-DB Core Library
//!
//! Patient record store with input validation and test-result history.
//!
//! # Architecture
//!
//! ```text
//!  JSON payload ──► Validator ──► RecordStore ──► Response
//!                   (schema)      │
//!                                 ├── MemoryStore  (per-record locks)
//!                                 └── SqliteStore  (one row per patient)
//! ```
//!
//! # Core Principle
//!
//! **Test history is append-only.** A record's tests only change through
//! [`RecordStore::append_test`], and each append to a patient is serialized
//! with every other mutation of that patient.
//!
//! # Modules
//!
//! - [`validation`]: Schema checks for untrusted JSON input
//! - [`models`]: Domain types (PatientRecord, TestResult)
//! - [`store`]: RecordStore trait with in-memory and SQLite backends
//! - [`db`]: SQLite database layer
//! - [`query`]: Read-side helpers (age listing, result summaries)
//! - [`handler`]: Route handlers producing status + body
//! - [`config`]: TOML configuration
//! - [`telemetry`]: Logging setup

pub mod config;
pub mod db;
pub mod handler;
pub mod models;
pub mod query;
pub mod store;
pub mod telemetry;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, ConfigError, LogFormat, LoggingConfig, StorageBackend, StorageConfig};
pub use db::{Database, DbError};
pub use handler::{HealthService, Response};
pub use models::{PatientRecord, TestResult};
pub use query::{list_over_age, roster, summarize};
pub use store::{
    open_store, DuplicatePolicy, MemoryStore, RecordStore, SqliteStore, StoreError, StoreResult,
};
pub use validation::{validate, FieldType, Schema, ValidationError};

use thiserror::Error;

/// Top-level error for callers that drive the whole service.
#[derive(Debug, Error)]
pub enum HealthDbError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl HealthDbError {
    /// Whether the error was caused by caller input rather than the service.
    pub fn is_client_error(&self) -> bool {
        match self {
            HealthDbError::Validation(_) => true,
            HealthDbError::Store(e) => e.is_client_error(),
            _ => false,
        }
    }
}
