//! Seeds a record store and prints the ward roster, adult listing and a
//! result summary.
//!
//! Usage: `health-db-demo [config.toml]`

use std::sync::Arc;

use anyhow::{Context, Result};
use health_db_core::{
    list_over_age, open_store, roster, summarize, telemetry, Config, HealthService,
};
use serde_json::json;
use tracing::info;

const LOCATIONS: [&str; 4] = ["Room 1", "Room 4", "ER", "Post-Op"];

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).with_context(|| format!("loading {}", path))?,
        None => Config::default(),
    };
    telemetry::init_logging(&config.logging);

    let store = open_store(&config.storage).context("opening record store")?;
    info!(backend = ?config.storage.backend, "Record store opened");

    for (name, id, blood_type, age) in [
        ("Ann Ables", 120, "A+", 30),
        ("Bob Boyles", 24, "B+", 31),
        ("Chris Chou", 33, "O-", 33),
        ("David Dinkins", 14, "AB+", 34),
    ] {
        store.create_with_age(name, id, blood_type, Some(age))?;
    }

    let service = HealthService::new(Arc::clone(&store));
    let response = service.add_test(&json!({"id": 24, "test_name": "HDL", "test_result": 65}))?;
    info!(status = response.status, body = %response.body, "add_test");

    if let Some(patient) = store.find(24)? {
        println!("{} adult: {:?}", patient, patient.is_adult());
    }

    for line in roster(store.as_ref(), &LOCATIONS)? {
        println!("{}", line);
    }

    println!("Patients above age 21");
    for name in list_over_age(21, store.as_ref())? {
        println!("{}", name);
    }

    print!("{}", summarize(24, store.as_ref())?);
    Ok(())
}
