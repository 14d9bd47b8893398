//! End-to-end tests of the patient routes over a configured store.

use std::sync::Arc;
use std::thread;

use health_db_core::handler::{STATUS_BAD_REQUEST, STATUS_OK};
use health_db_core::{open_store, Config, HealthService, RecordStore, Response, TestResult};
use serde_json::json;

fn service_from_toml(toml: &str) -> HealthService<dyn RecordStore> {
    let config = Config::from_toml_str(toml).unwrap();
    HealthService::new(open_store(&config.storage).unwrap())
}

#[test]
fn test_full_patient_flow_memory() {
    let svc = service_from_toml("");
    run_patient_flow(&svc);
}

#[test]
fn test_full_patient_flow_sqlite_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("health.db");
    let toml = format!(
        "[storage]\nbackend = \"sqlite\"\npath = {:?}\n",
        path.to_string_lossy()
    );

    run_patient_flow(&service_from_toml(&toml));

    // Data survives a fresh service over the same file
    let reopened = service_from_toml(&toml);
    let response = reopened.get_results("1").unwrap();
    assert_eq!(response.status, STATUS_OK);
    assert!(response.body.contains("('LDL', 130)"));
}

fn run_patient_flow(svc: &HealthService<dyn RecordStore>) {
    assert_eq!(svc.status(), Response::ok("Server is on"));

    let response = svc
        .new_patient(&json!({"name": "David", "id": 1, "blood_type": "O+"}))
        .unwrap();
    assert_eq!(response.status, STATUS_OK);

    for (name, result) in [("HDL", 65), ("LDL", 130)] {
        let response = svc
            .add_test(&json!({"id": 1, "test_name": name, "test_result": result}))
            .unwrap();
        assert_eq!(response, Response::ok("Added test to patient id 1"));
    }

    let response = svc.get_results("1").unwrap();
    assert_eq!(
        response.body,
        "Patient Name: David\nTest Results:\n('HDL', 65)\n('LDL', 130)\n"
    );
}

#[test]
fn test_bad_requests_leave_store_untouched() {
    let svc = service_from_toml("");

    let bad_payloads = [
        json!("not a map"),
        json!({"id": 1, "blood_type": "O+"}),
        json!({"name": "David", "id": "1", "blood_type": "O+"}),
        json!({"name": "David", "id": 1.0, "blood_type": "O+"}),
        json!({"name": "", "id": 1, "blood_type": "O+"}),
    ];
    for payload in &bad_payloads {
        let response = svc.new_patient(payload).unwrap();
        assert_eq!(response.status, STATUS_BAD_REQUEST, "{payload}");
    }
    assert!(svc.store().is_empty().unwrap());
}

#[test]
fn test_extra_fields_ignored() {
    let svc = service_from_toml("");
    let response = svc
        .new_patient(&json!({
            "name": "David",
            "id": 1,
            "blood_type": "O+",
            "ward": "ER",
        }))
        .unwrap();
    assert_eq!(response.status, STATUS_OK);
}

#[test]
fn test_optional_age_is_stored() {
    let svc = service_from_toml("");
    svc.new_patient(&json!({"name": "David", "id": 1, "blood_type": "O+", "age": 40}))
        .unwrap();
    assert_eq!(svc.store().find(1).unwrap().unwrap().is_adult(), Some(true));
}

#[test]
fn test_overwrite_policy_from_config() {
    let svc = service_from_toml("[storage]\nduplicate_policy = \"overwrite\"\n");
    let payload = json!({"name": "David", "id": 1, "blood_type": "O+"});

    assert_eq!(svc.new_patient(&payload).unwrap().status, STATUS_OK);
    assert_eq!(svc.new_patient(&payload).unwrap().status, STATUS_OK);
    assert_eq!(svc.store().len().unwrap(), 1);
}

#[test]
fn test_concurrent_add_test_requests() {
    let svc = service_from_toml("[storage]\nbackend = \"sqlite\"\n");
    svc.new_patient(&json!({"name": "David", "id": 1, "blood_type": "O+"}))
        .unwrap();

    let first = {
        let svc = svc.clone();
        thread::spawn(move || {
            svc.add_test(&json!({"id": 1, "test_name": "HDL", "test_result": 65}))
                .unwrap()
        })
    };
    let second = {
        let svc = svc.clone();
        thread::spawn(move || {
            svc.add_test(&json!({"id": 1, "test_name": "LDL", "test_result": 130}))
                .unwrap()
        })
    };
    assert!(first.join().unwrap().is_ok());
    assert!(second.join().unwrap().is_ok());

    let tests = svc.store().find(1).unwrap().unwrap().tests;
    assert_eq!(tests.len(), 2);
    assert!(tests.contains(&TestResult::new("HDL", 65)));
    assert!(tests.contains(&TestResult::new("LDL", 130)));
}

#[test]
fn test_shared_store_handle() {
    let store = open_store(&Config::default().storage).unwrap();
    let svc = HealthService::new(Arc::clone(&store));

    store.create("David", 1, "O+").unwrap();
    assert_eq!(svc.get_results("1").unwrap().status, STATUS_OK);
}
