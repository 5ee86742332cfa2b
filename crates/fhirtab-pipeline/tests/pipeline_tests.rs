//! End-to-end pipeline tests over an in-memory sink
//!
//! These tests cover:
//! - A full run across all three stages from a directory of bundles
//! - Schema evolution when a later bundle introduces a new column
//! - Clean termination when a bundle has no entry list
//! - Batch failures flagged without aborting the run

use fhirtab_ingest::{BundleReader, BundleSource};
use fhirtab_model::ModelRegistry;
use fhirtab_pipeline::{run_pipeline, MemorySink, PipelineOptions, SinkOp, TransformError};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn write_bundle(dir: &TempDir, name: &str, body: serde_json::Value) {
    fs::write(dir.path().join(name), body.to_string()).unwrap();
}

fn patient_entry(id: &str, gender: Option<&str>) -> serde_json::Value {
    let mut resource = serde_json::json!({
        "resourceType": "Patient",
        "id": id,
        "name": [{"family": "Doe"}]
    });
    if let Some(gender) = gender {
        resource["gender"] = serde_json::Value::String(gender.to_string());
    }
    serde_json::json!({
        "fullUrl": format!("urn:uuid:{id}"),
        "resource": resource,
        "request": {"method": "POST", "url": "Patient"}
    })
}

async fn run_over_dir(dir: &TempDir, sink: Arc<MemorySink>) -> fhirtab_pipeline::PipelineReport {
    run_pipeline(
        BundleReader::new().unwrap(),
        BundleSource::LocalDir(dir.path().to_path_buf()),
        ModelRegistry::with_defaults(),
        sink,
        PipelineOptions::default(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_three_bundles_flow_through_all_stages() {
    let dir = TempDir::new().unwrap();
    write_bundle(
        &dir,
        "01_patient.json",
        serde_json::json!({
            "resourceType": "Bundle",
            "id": "b1",
            "type": "transaction",
            "entry": [patient_entry("1", None)]
        }),
    );
    write_bundle(
        &dir,
        "02_patient.json",
        serde_json::json!({
            "resourceType": "Bundle",
            "id": "b2",
            "type": "transaction",
            "entry": [patient_entry("2", Some("male"))]
        }),
    );
    write_bundle(
        &dir,
        "03_mixed.json",
        serde_json::json!({
            "resourceType": "Bundle",
            "id": "b3",
            "type": "transaction",
            "entry": [
                patient_entry("3", Some("female")),
                {"resource": {"resourceType": "Observation", "id": "o1", "status": "final"}}
            ]
        }),
    );

    let sink = Arc::new(MemorySink::new());
    let report = run_over_dir(&dir, Arc::clone(&sink)).await;

    assert!(report.success());
    let ingest = report.ingest.unwrap();
    assert_eq!(ingest.discovered, 3);
    assert_eq!(ingest.enqueued, 3);

    let transform = report.transform.unwrap();
    assert_eq!(transform.bundles, 3);
    assert_eq!(transform.rows, 4);
    assert_eq!(transform.skipped_entries, 0);

    assert_eq!(report.load.batches, 3);
    assert_eq!(report.load.rows, 4);
    assert!(report.load.all_loaded());

    let ops = sink.ops().await;
    let gender_migrations = ops
        .iter()
        .filter(|op| {
            matches!(op, SinkOp::AddColumn { table, column } if table == "Patient" && column == "gender")
        })
        .count();
    assert_eq!(gender_migrations, 1, "gender is migrated exactly once");

    let patient_pks = ops
        .iter()
        .filter(|op| {
            matches!(op, SinkOp::DeclarePrimaryKey { table, column } if table == "Patient" && column == "id")
        })
        .count();
    assert_eq!(patient_pks, 1, "primary key asserted exactly once");

    let patient_appends = ops
        .iter()
        .filter(|op| matches!(op, SinkOp::Append { table, .. } if table == "Patient"))
        .count();
    let observation_appends = ops
        .iter()
        .filter(|op| matches!(op, SinkOp::Append { table, .. } if table == "Observation"))
        .count();
    assert_eq!(patient_appends, 3);
    assert_eq!(observation_appends, 1);
}

#[tokio::test]
async fn test_bundle_without_entries_terminates_run_cleanly() {
    let dir = TempDir::new().unwrap();
    write_bundle(
        &dir,
        "01_ok.json",
        serde_json::json!({
            "resourceType": "Bundle",
            "id": "b1",
            "entry": [patient_entry("1", Some("male"))]
        }),
    );
    write_bundle(
        &dir,
        "02_broken.json",
        serde_json::json!({"resourceType": "Bundle", "id": "broken"}),
    );
    write_bundle(
        &dir,
        "03_never_reached.json",
        serde_json::json!({
            "resourceType": "Bundle",
            "id": "b3",
            "entry": [patient_entry("3", Some("female"))]
        }),
    );

    let sink = Arc::new(MemorySink::new());
    let report = run_over_dir(&dir, Arc::clone(&sink)).await;

    assert!(!report.success());
    match report.transform {
        Err(TransformError::MissingEntries { ref bundle_id }) => {
            assert_eq!(bundle_id, "broken");
        }
        ref other => panic!("expected MissingEntries, got {other:?}"),
    }

    // Only the bundle before the broken one became a batch, and the load
    // stage exited instead of waiting on more input.
    assert_eq!(report.load.batches, 1);
    assert!(report.load.all_loaded());
    assert_eq!(report.load.rows, 1);
}

#[tokio::test]
async fn test_rejected_batches_are_flagged_not_fatal() {
    let dir = TempDir::new().unwrap();
    write_bundle(
        &dir,
        "01_patient.json",
        serde_json::json!({
            "resourceType": "Bundle",
            "id": "b1",
            "entry": [patient_entry("1", None)]
        }),
    );
    write_bundle(
        &dir,
        "02_patient.json",
        serde_json::json!({
            "resourceType": "Bundle",
            "id": "b2",
            "entry": [patient_entry("2", None)]
        }),
    );

    let sink = Arc::new(MemorySink::new().with_failing_tables(["Patient"]));
    let report = run_over_dir(&dir, Arc::clone(&sink)).await;

    assert!(!report.success());
    assert!(report.ingest.is_ok());
    assert!(report.transform.is_ok());
    assert_eq!(report.load.batches, 2);
    assert_eq!(report.load.failed_batches, 2);
    assert_eq!(report.load.rows, 0);
    assert!(sink.ops().await.is_empty());
}
