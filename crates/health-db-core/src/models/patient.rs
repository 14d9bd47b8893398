//! Patient models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Age at which a patient counts as an adult.
pub const ADULT_AGE: u32 = 21;

/// A single test result: `(test_name, test_result)`.
///
/// Serialized as a two-element array, e.g. `["HDL", 65]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestResult(pub String, pub i64);

impl TestResult {
    /// Create a new test result.
    pub fn new(test_name: impl Into<String>, test_result: i64) -> Self {
        Self(test_name.into(), test_result)
    }

    /// Name of the test (e.g. "HDL").
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Measured value.
    pub fn value(&self) -> i64 {
        self.1
    }
}

/// Renders as a quoted pair, e.g. `('HDL', 65)`.
///
/// The name is single-quoted unless it contains a single quote and no
/// double quote, in which case it is double-quoted.
impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quote = if self.0.contains('\'') && !self.0.contains('"') {
            '"'
        } else {
            '\''
        };

        let mut name = String::with_capacity(self.0.len() + 2);
        name.push(quote);
        for c in self.0.chars() {
            if c == '\\' || c == quote {
                name.push('\\');
            }
            name.push(c);
        }
        name.push(quote);

        write!(f, "({}, {})", name, self.1)
    }
}

/// A patient record and its test history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    /// Patient name
    pub name: String,
    /// Primary key, usually a medical record number
    pub id: i64,
    /// Blood type (e.g., "O+", "AB-")
    pub blood_type: String,
    /// Age in years, if known
    #[serde(default)]
    pub age: Option<u32>,
    /// Test results in the order they were recorded
    #[serde(default)]
    pub tests: Vec<TestResult>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl PatientRecord {
    /// Create a new record with no tests.
    pub fn new(name: String, id: i64, blood_type: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            name,
            id,
            blood_type,
            age: None,
            tests: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Builder-style age setter.
    pub fn with_age(mut self, age: Option<u32>) -> Self {
        self.age = age;
        self
    }

    /// Append a test result to the end of the history.
    ///
    /// Only the store calls this; collaborators go through
    /// `RecordStore::append_test`.
    pub(crate) fn push_test(&mut self, test: TestResult) {
        self.tests.push(test);
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Whether the patient is an adult. `None` when the age is unknown.
    pub fn is_adult(&self) -> Option<bool> {
        self.age.map(|age| age >= ADULT_AGE)
    }
}

impl fmt::Display for PatientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.name)
    }
}
