//! Read-side helpers over a record store.

use crate::store::{RecordStore, StoreError, StoreResult};

/// Names of patients strictly older than `threshold`, in insertion order.
///
/// Each call takes a fresh snapshot; records without an age are skipped.
pub fn list_over_age<S: RecordStore + ?Sized>(
    threshold: u32,
    store: &S,
) -> StoreResult<impl Iterator<Item = String>> {
    let records = store.snapshot()?;
    Ok(records
        .into_iter()
        .filter(move |record| record.age.is_some_and(|age| age > threshold))
        .map(|record| record.name))
}

/// Render a patient's test history.
///
/// ```text
/// Patient Name: David
/// Test Results:
/// ('HDL', 65)
/// ('LDL', 130)
/// ```
pub fn summarize<S: RecordStore + ?Sized>(id: i64, store: &S) -> StoreResult<String> {
    let record = store.find(id)?.ok_or(StoreError::NotFound(id))?;

    let mut results = format!("Patient Name: {}\nTest Results:\n", record.name);
    for test in &record.tests {
        results.push_str(&test.to_string());
        results.push('\n');
    }
    Ok(results)
}

/// Pair each patient, in insertion order, with a location label.
///
/// Stops at whichever runs out first.
pub fn roster<S, L>(store: &S, locations: &[L]) -> StoreResult<Vec<String>>
where
    S: RecordStore + ?Sized,
    L: AsRef<str>,
{
    let records = store.snapshot()?;
    Ok(records
        .iter()
        .zip(locations)
        .map(|(record, location)| format!("{} - {}", record.name, location.as_ref()))
        .collect())
}
