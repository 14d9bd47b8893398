//! Domain models for the health-db system.

mod patient;

pub use patient::*;
