//! The image workflow capability.
//!
//! A `Workflow` is "process one image with these parameters, return outputs".
//! The hosted workflow computes the embedding and performs the store upsert
//! itself; callers only supply the parameters it needs to do so.

pub mod remote;

pub use remote::{RemoteWorkflow, DEFAULT_INFERENCE_URL, DEFAULT_WORKFLOW_ID, DEFAULT_WORKSPACE};

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{IndexerError, Result};
use crate::CameraId;

/// Parameter names the hosted workflow reads.
pub const PARAM_CAMERA_ID: &str = "camera_id";
pub const PARAM_STORE_URL: &str = "SUPABASE_URL";
pub const PARAM_STORE_KEY: &str = "SUPABASE_KEY";

/// Named parameters passed alongside the image.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowParams {
    pub camera_id: CameraId,
    pub store_url: Option<String>,
    pub store_key: Option<String>,
}

impl WorkflowParams {
    /// Parameter map in wire form. Missing credentials are sent as `null`.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            PARAM_CAMERA_ID.to_string(),
            Value::String(self.camera_id.to_string()),
        );
        map.insert(PARAM_STORE_URL.to_string(), optional(&self.store_url));
        map.insert(PARAM_STORE_KEY.to_string(), optional(&self.store_key));
        map
    }
}

fn optional(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

pub trait Workflow {
    /// Run the workflow on the image at `image` and return its outputs.
    fn run(&self, image: &Path, params: &WorkflowParams) -> Result<Vec<Value>>;
}

impl<T: Workflow + ?Sized> Workflow for &T {
    fn run(&self, image: &Path, params: &WorkflowParams) -> Result<Vec<Value>> {
        (**self).run(image, params)
    }
}

/// Pull `outputs[0]["result"]`, the only part of a run the poller consults.
pub fn extract_result(outputs: Vec<Value>) -> Result<Value> {
    let first = outputs
        .into_iter()
        .next()
        .ok_or_else(|| IndexerError::inference("workflow returned no outputs"))?;
    match first {
        Value::Object(mut fields) => fields
            .remove("result")
            .ok_or_else(|| IndexerError::inference("workflow output missing 'result'")),
        other => Err(IndexerError::inference(format!(
            "workflow output is not an object: {}",
            other
        ))),
    }
}
