//! Per-camera pipeline.
//!
//! One attempt is: fetch the snapshot, park it in a scratch file, run the
//! workflow on it, report the result, remove the scratch file. Every failure
//! is logged with the camera id and folded into an `AttemptOutcome`; nothing
//! escapes to the scheduler.

use serde_json::Value;
use std::path::PathBuf;

use crate::error::{IndexerError, Result};
use crate::inference::{extract_result, Workflow, WorkflowParams};
use crate::ingest::SnapshotSource;
use crate::scheduler::CameraProcessor;
use crate::scratch::ScratchFile;
use crate::CameraId;

/// How a single attempt ended.
#[derive(Clone, Debug, PartialEq)]
pub enum AttemptOutcome {
    /// The workflow ran; `result` is whatever it reported, including in-band
    /// store errors.
    Completed { result: Value },
    /// The snapshot endpoint answered outside the 2xx range.
    FetchFailed { status: u16 },
    /// Any other failure on the way.
    Failed { reason: String },
}

impl AttemptOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, AttemptOutcome::Completed { .. })
    }
}

/// Credentials forwarded to the workflow for its store write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreCredentials {
    pub url: Option<String>,
    pub key: Option<String>,
}

pub struct CameraPipeline<S, W> {
    source: S,
    workflow: W,
    scratch_dir: PathBuf,
    store: StoreCredentials,
}

impl<S: SnapshotSource, W: Workflow> CameraPipeline<S, W> {
    pub fn new(
        source: S,
        workflow: W,
        scratch_dir: impl Into<PathBuf>,
        store: StoreCredentials,
    ) -> Self {
        Self {
            source,
            workflow,
            scratch_dir: scratch_dir.into(),
            store,
        }
    }

    /// Run one attempt for `camera_id`. Never fails; see `AttemptOutcome`.
    pub fn process(&self, camera_id: &CameraId) -> AttemptOutcome {
        match self.try_process(camera_id) {
            Ok(result) => {
                log::info!("processed camera {}, the result is: {}", camera_id, result);
                AttemptOutcome::Completed { result }
            }
            Err(IndexerError::ImageStatus { status, .. }) => {
                log::warn!(
                    "failed to fetch image from camera {}: status {}",
                    camera_id,
                    status
                );
                AttemptOutcome::FetchFailed { status }
            }
            Err(e) => {
                log::error!("error processing camera {}: {}", camera_id, e);
                AttemptOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn try_process(&self, camera_id: &CameraId) -> Result<Value> {
        let snapshot = self.source.fetch(camera_id)?;
        let scratch = ScratchFile::create(&self.scratch_dir, camera_id, &snapshot.bytes)?;
        drop(snapshot);

        let params = WorkflowParams {
            camera_id: camera_id.clone(),
            store_url: self.store.url.clone(),
            store_key: self.store.key.clone(),
        };
        let outputs = self.workflow.run(scratch.path(), &params)?;
        extract_result(outputs)
    }
}

impl<S: SnapshotSource, W: Workflow> CameraProcessor for CameraPipeline<S, W> {
    fn process(&mut self, camera_id: &CameraId) -> AttemptOutcome {
        CameraPipeline::process(self, camera_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::CameraSnapshot;
    use serde_json::json;
    use std::cell::RefCell;
    use std::path::Path;

    struct FixedSource;

    impl SnapshotSource for FixedSource {
        fn fetch(&self, camera_id: &CameraId) -> Result<CameraSnapshot> {
            Ok(CameraSnapshot {
                camera_id: camera_id.clone(),
                bytes: b"jpeg".to_vec(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingWorkflow {
        seen: RefCell<Vec<(PathBuf, WorkflowParams, Vec<u8>)>>,
    }

    impl Workflow for RecordingWorkflow {
        fn run(&self, image: &Path, params: &WorkflowParams) -> Result<Vec<Value>> {
            let bytes = std::fs::read(image).unwrap();
            self.seen
                .borrow_mut()
                .push((image.to_path_buf(), params.clone(), bytes));
            Ok(vec![json!({"result": {"status": "Successfully updated the database!"}})])
        }
    }

    #[test]
    fn workflow_sees_snapshot_and_store_params() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = RecordingWorkflow::default();
        let store = StoreCredentials {
            url: Some("https://store.example".to_string()),
            key: Some("secret".to_string()),
        };
        let pipeline = CameraPipeline::new(FixedSource, &workflow, dir.path(), store);

        let outcome = pipeline.process(&CameraId::new("cam-7"));

        assert_eq!(
            outcome,
            AttemptOutcome::Completed {
                result: json!({"status": "Successfully updated the database!"})
            }
        );
        let seen = workflow.seen.borrow();
        let (path, params, bytes) = &seen[0];
        assert_eq!(path, &dir.path().join("cam-7_image.jpg"));
        assert_eq!(bytes, b"jpeg");
        assert_eq!(params.camera_id.as_str(), "cam-7");
        assert_eq!(params.store_key.as_deref(), Some("secret"));
        assert!(!path.exists());
    }
}
