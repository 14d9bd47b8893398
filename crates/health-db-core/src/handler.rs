//! Request handling for the patient routes.
//!
//! Transport-agnostic: each route takes the already-decoded request (a JSON
//! value or a path segment) and returns a [`Response`] with an HTTP-style
//! status. Caller mistakes (bad payloads, unknown ids, duplicate ids) are
//! `400` responses. Storage failures come back as `Err` for the transport to
//! treat as fatal.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::query::summarize;
use crate::store::{RecordStore, StoreError};
use crate::validation::{validate, Schema};
use crate::HealthDbError;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;

/// Status code plus text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK,
            body: body.into(),
        }
    }

    pub fn bad_request(body: impl Into<String>) -> Self {
        Self {
            status: STATUS_BAD_REQUEST,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

pub type HandlerResult = Result<Response, HealthDbError>;

/// Body of `POST /new_patient`.
#[derive(Debug, Deserialize)]
struct NewPatientRequest {
    name: String,
    id: i64,
    blood_type: String,
    #[serde(default)]
    age: Option<u32>,
}

/// Body of `POST /add_test`.
#[derive(Debug, Deserialize)]
struct AddTestRequest {
    id: i64,
    test_name: String,
    test_result: i64,
}

/// The patient service, owning a handle to its record store.
pub struct HealthService<S: RecordStore + ?Sized> {
    store: Arc<S>,
}

impl<S: RecordStore + ?Sized> Clone for HealthService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RecordStore + ?Sized> HealthService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// `GET /`
    pub fn status(&self) -> Response {
        Response::ok("Server is on")
    }

    /// `POST /new_patient` with `{"name": str, "id": int, "blood_type": str}`.
    pub fn new_patient(&self, payload: &Value) -> HandlerResult {
        if let Err(e) = validate(payload, &Schema::new_patient()) {
            warn!(error = %e, "Rejected new_patient payload");
            return Ok(Response::bad_request(e.to_string()));
        }
        let request = match NewPatientRequest::deserialize(payload) {
            Ok(request) => request,
            Err(e) => return Ok(Response::bad_request(e.to_string())),
        };

        let created = self.store.create_with_age(
            &request.name,
            request.id,
            &request.blood_type,
            request.age,
        );
        match created {
            Ok(record) => {
                info!(id = record.id, "Added patient");
                let body = serde_json::to_string(&record)?;
                Ok(Response::ok(format!("Added patient {}", body)))
            }
            Err(e) => self.store_failure(e),
        }
    }

    /// `POST /add_test` with `{"id": int, "test_name": str, "test_result": int}`.
    pub fn add_test(&self, payload: &Value) -> HandlerResult {
        if let Err(e) = validate(payload, &Schema::add_test()) {
            warn!(error = %e, "Rejected add_test payload");
            return Ok(Response::bad_request(e.to_string()));
        }
        let request = match AddTestRequest::deserialize(payload) {
            Ok(request) => request,
            Err(e) => return Ok(Response::bad_request(e.to_string())),
        };

        // Lookup and append happen under one lock, so a missing patient is
        // reported by the append itself.
        match self
            .store
            .append_test(request.id, &request.test_name, request.test_result)
        {
            Ok(record) => {
                info!(id = record.id, test = %request.test_name, "Added test result");
                Ok(Response::ok(format!("Added test to patient id {}", record.id)))
            }
            Err(e) => self.store_failure(e),
        }
    }

    /// `GET /get_results/<patient_id>`
    pub fn get_results(&self, patient_id: &str) -> HandlerResult {
        let id: i64 = match patient_id.trim().parse() {
            Ok(id) => id,
            Err(_) => {
                warn!(patient_id, "Patient id was not a valid integer");
                return Ok(Response::bad_request("Patient id was not a valid integer"));
            }
        };

        match summarize(id, self.store.as_ref()) {
            Ok(summary) => {
                debug!(id, "Generated results");
                Ok(Response::ok(summary))
            }
            Err(StoreError::NotFound(_)) => {
                warn!(id, "Results requested for unknown patient");
                Ok(Response::bad_request(format!(
                    "Patient id of {} does not exist in database",
                    id
                )))
            }
            Err(e) => self.store_failure(e),
        }
    }

    fn store_failure(&self, e: StoreError) -> HandlerResult {
        if e.is_client_error() {
            warn!(error = %e, "Request rejected");
            Ok(Response::bad_request(e.to_string()))
        } else {
            error!(error = %e, "Store failure");
            Err(e.into())
        }
    }
}
