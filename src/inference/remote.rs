//! Client for a hosted inference server's workflow endpoint.
//!
//! `POST <api_url>/infer/workflows/<workspace>/<workflow_id>` with
//! `{"api_key": ..., "inputs": {"image": {"type": "base64", "value": ...}, <params>}}`.
//! The server answers `{"outputs": [...]}`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::Path;

use super::{Workflow, WorkflowParams};
use crate::error::{IndexerError, Result};
use crate::transport::{body_text, read_body};

pub const DEFAULT_INFERENCE_URL: &str = "http://localhost:9001";
pub const DEFAULT_WORKSPACE: &str = "shortest-hackathon";
pub const DEFAULT_WORKFLOW_ID: &str = "indexwebcam";

/// Name of the image slot the workflow reads.
const IMAGE_INPUT: &str = "image";

#[derive(Debug, Deserialize)]
struct WorkflowResponse {
    #[serde(default)]
    outputs: Vec<Value>,
}

pub struct RemoteWorkflow {
    agent: ureq::Agent,
    api_url: String,
    api_key: Option<String>,
    workspace: String,
    workflow_id: String,
}

impl RemoteWorkflow {
    pub fn new(
        agent: ureq::Agent,
        api_url: impl Into<String>,
        api_key: Option<String>,
        workspace: impl Into<String>,
        workflow_id: impl Into<String>,
    ) -> Self {
        Self {
            agent,
            api_url: api_url.into(),
            api_key,
            workspace: workspace.into(),
            workflow_id: workflow_id.into(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/infer/workflows/{}/{}",
            self.api_url.trim_end_matches('/'),
            self.workspace,
            self.workflow_id
        )
    }

    fn request_body(&self, image_bytes: &[u8], params: &WorkflowParams) -> Map<String, Value> {
        let mut inputs = params.to_map();
        inputs.insert(
            IMAGE_INPUT.to_string(),
            json!({"type": "base64", "value": BASE64.encode(image_bytes)}),
        );
        inputs
    }

    /// POST `inputs` to the workflow and return its `outputs`.
    pub fn invoke(&self, inputs: Map<String, Value>) -> Result<Vec<Value>> {
        let body = json!({
            "api_key": self.api_key,
            "inputs": inputs,
        });

        let response = match self.agent.post(&self.endpoint()).send_json(body) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                return Err(IndexerError::inference(format!(
                    "workflow {}/{} returned status {}: {}",
                    self.workspace,
                    self.workflow_id,
                    status,
                    body_text(response)
                )))
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(IndexerError::inference(format!(
                    "workflow {}/{} unreachable: {}",
                    self.workspace, self.workflow_id, transport
                )))
            }
        };

        let bytes = read_body(response)
            .map_err(|e| IndexerError::inference(format!("read workflow response: {}", e)))?;
        let parsed: WorkflowResponse = serde_json::from_slice(&bytes)
            .map_err(|e| IndexerError::inference(format!("invalid workflow response: {}", e)))?;
        Ok(parsed.outputs)
    }
}

impl Workflow for RemoteWorkflow {
    fn run(&self, image: &Path, params: &WorkflowParams) -> Result<Vec<Value>> {
        let image_bytes = std::fs::read(image).map_err(|source| IndexerError::Scratch {
            path: image.to_path_buf(),
            source,
        })?;
        self.invoke(self.request_body(&image_bytes, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CameraId;
    use std::time::Duration;

    fn workflow(api_url: &str) -> RemoteWorkflow {
        RemoteWorkflow::new(
            crate::transport::http_agent(Duration::from_secs(1)),
            api_url,
            Some("rf-key".to_string()),
            DEFAULT_WORKSPACE,
            DEFAULT_WORKFLOW_ID,
        )
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        assert_eq!(
            workflow("http://localhost:9001/").endpoint(),
            "http://localhost:9001/infer/workflows/shortest-hackathon/indexwebcam"
        );
    }

    #[test]
    fn body_carries_image_and_params() {
        let params = WorkflowParams {
            camera_id: CameraId::new("cam-1"),
            store_url: None,
            store_key: Some("sb-key".to_string()),
        };
        let inputs = workflow(DEFAULT_INFERENCE_URL).request_body(b"\xff\xd8", &params);
        assert_eq!(inputs["image"]["type"], "base64");
        assert_eq!(inputs["image"]["value"], "/9g=");
        assert_eq!(inputs["camera_id"], "cam-1");
        assert_eq!(inputs["SUPABASE_KEY"], "sb-key");
        assert!(inputs["SUPABASE_URL"].is_null());
    }
}
