use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::tempdir;

use webcam_indexer::pipeline::StoreCredentials;
use webcam_indexer::{
    AttemptOutcome, CameraId, CameraPipeline, CameraSnapshot, IndexerError, Result, Roster,
    Scheduler, SnapshotSource, Workflow, WorkflowParams,
};

/// Serves a fixed status per camera; 200 unless listed.
struct StatusSource {
    failing: Vec<(&'static str, u16)>,
}

impl SnapshotSource for StatusSource {
    fn fetch(&self, camera_id: &CameraId) -> Result<CameraSnapshot> {
        if let Some((_, status)) = self.failing.iter().find(|(id, _)| *id == camera_id.as_str()) {
            return Err(IndexerError::ImageStatus {
                camera_id: camera_id.to_string(),
                status: *status,
            });
        }
        Ok(CameraSnapshot {
            camera_id: camera_id.clone(),
            bytes: format!("jpeg:{}", camera_id).into_bytes(),
        })
    }
}

/// Every fetch fails below the HTTP layer.
struct UnreachableSource;

impl SnapshotSource for UnreachableSource {
    fn fetch(&self, camera_id: &CameraId) -> Result<CameraSnapshot> {
        Err(IndexerError::ImageTransport {
            camera_id: camera_id.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

enum Behaviour {
    Ok(Value),
    Fail(&'static str),
}

struct ScriptedWorkflow {
    behaviour: Behaviour,
    calls: RefCell<Vec<String>>,
    scratch_seen: RefCell<Vec<PathBuf>>,
}

impl ScriptedWorkflow {
    fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: RefCell::new(Vec::new()),
            scratch_seen: RefCell::new(Vec::new()),
        }
    }
}

impl Workflow for ScriptedWorkflow {
    fn run(&self, image: &Path, params: &WorkflowParams) -> Result<Vec<Value>> {
        assert!(image.exists(), "scratch file must exist during the call");
        self.calls.borrow_mut().push(params.camera_id.to_string());
        self.scratch_seen.borrow_mut().push(image.to_path_buf());
        match &self.behaviour {
            Behaviour::Ok(output) => Ok(vec![output.clone()]),
            Behaviour::Fail(reason) => Err(IndexerError::inference(*reason)),
        }
    }
}

fn scratch_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

#[test]
fn fetch_failure_skips_workflow_and_scheduler_moves_on() {
    let dir = tempdir().unwrap();
    let source = StatusSource {
        failing: vec![("B", 500)],
    };
    let workflow = ScriptedWorkflow::new(Behaviour::Ok(json!({"result": {"status": "ok"}})));
    let mut pipeline =
        CameraPipeline::new(source, &workflow, dir.path(), StoreCredentials::default());
    let roster: Roster = ["A", "B", "C"].into_iter().collect();
    let mut scheduler = Scheduler::new(roster, Duration::ZERO);

    scheduler.step(&mut pipeline);
    let outcome = scheduler.step(&mut pipeline);

    assert_eq!(outcome, Some(AttemptOutcome::FetchFailed { status: 500 }));
    assert_eq!(*workflow.calls.borrow(), vec!["A"]);
    assert_eq!(scheduler.current().map(CameraId::as_str), Some("C"));

    scheduler.step(&mut pipeline);
    assert_eq!(*workflow.calls.borrow(), vec!["A", "C"]);
    assert!(scratch_files(dir.path()).is_empty());
}

#[test]
fn unreachable_camera_is_failed_without_workflow_call() {
    let dir = tempdir().unwrap();
    let workflow = ScriptedWorkflow::new(Behaviour::Ok(json!({"result": {"status": "ok"}})));
    let pipeline = CameraPipeline::new(
        UnreachableSource,
        &workflow,
        dir.path(),
        StoreCredentials::default(),
    );

    let outcome = pipeline.process(&CameraId::new("A"));

    match outcome {
        AttemptOutcome::Failed { reason } => assert!(reason.contains("connection refused")),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(workflow.calls.borrow().is_empty());
    assert!(scratch_files(dir.path()).is_empty());
}

#[test]
fn workflow_failure_still_removes_scratch_file() {
    let dir = tempdir().unwrap();
    let workflow = ScriptedWorkflow::new(Behaviour::Fail("connection refused"));
    let pipeline = CameraPipeline::new(
        StatusSource { failing: vec![] },
        &workflow,
        dir.path(),
        StoreCredentials::default(),
    );

    let outcome = pipeline.process(&CameraId::new("A"));

    match outcome {
        AttemptOutcome::Failed { reason } => assert!(reason.contains("connection refused")),
        other => panic!("unexpected outcome {:?}", other),
    }
    let seen = workflow.scratch_seen.borrow();
    assert_eq!(seen.as_slice(), &[dir.path().join("A_image.jpg")]);
    assert!(scratch_files(dir.path()).is_empty());
}

#[test]
fn store_error_status_is_reported_not_raised() {
    let dir = tempdir().unwrap();
    let status = "Error upserting data:409{\"message\":\"duplicate key\"}";
    let workflow = ScriptedWorkflow::new(Behaviour::Ok(json!({
        "result": {"status": status}
    })));
    let store = StoreCredentials {
        url: Some("https://proj.supabase.co".to_string()),
        key: Some("service-key".to_string()),
    };
    let pipeline = CameraPipeline::new(StatusSource { failing: vec![] }, &workflow, dir.path(), store);

    let outcome = pipeline.process(&CameraId::new("A"));

    assert_eq!(
        outcome,
        AttemptOutcome::Completed {
            result: json!({"status": status})
        }
    );
    assert!(!dir.path().join("A_image.jpg").exists());
}

#[test]
fn malformed_workflow_output_is_absorbed() {
    let dir = tempdir().unwrap();
    let workflow = ScriptedWorkflow::new(Behaviour::Ok(json!({"embedding": [0.1, 0.2]})));
    let pipeline = CameraPipeline::new(
        StatusSource { failing: vec![] },
        &workflow,
        dir.path(),
        StoreCredentials::default(),
    );

    let outcome = pipeline.process(&CameraId::new("A"));

    assert!(matches!(outcome, AttemptOutcome::Failed { .. }));
    assert!(scratch_files(dir.path()).is_empty());
}

#[test]
fn unwritable_scratch_dir_is_a_failed_attempt() {
    let dir = tempdir().unwrap();
    let workflow = ScriptedWorkflow::new(Behaviour::Ok(json!({"result": {}})));
    let pipeline = CameraPipeline::new(
        StatusSource { failing: vec![] },
        &workflow,
        dir.path().join("missing"),
        StoreCredentials::default(),
    );

    let outcome = pipeline.process(&CameraId::new("A"));

    assert!(matches!(outcome, AttemptOutcome::Failed { .. }));
    assert!(workflow.calls.borrow().is_empty());
}
