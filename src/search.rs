//! Text search over the stored camera embeddings.
//!
//! The read side of the index. A free-text query is embedded by a hosted
//! workflow (same `/infer/workflows/...` route as indexing), the store's
//! `match_cameras` RPC ranks cameras by distance to that embedding, and the
//! ranking is turned into a best match plus per-camera heat intensities.
//! When nothing matches, the first cameras in the table are returned without
//! a distance so the map still has something to show.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{IndexerError, Result};
use crate::inference::RemoteWorkflow;
use crate::store::{self, DEFAULT_TABLE};
use crate::transport::{body_text, read_body};
use crate::CameraId;

pub const DEFAULT_TEXT_WORKFLOW_ID: &str = "embed-text";
/// Image the text workflow requires in its `image` slot; its content is ignored.
pub const DEFAULT_REFERENCE_IMAGE_URL: &str =
    "https://source.roboflow.com/c8QoUtY71EUIn6gsXQMkSt8K0fC3/lUis6HgjW32zZv1WYVKQ/thumb.jpg";
pub const DEFAULT_MATCH_COUNT: usize = 25;
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.0;
const MATCH_RPC: &str = "match_cameras";

/// One ranked (or fallback) camera row.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CameraMatch {
    pub camera_id: CameraId,
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng", alias = "lon")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub distance: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeatPoint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub intensity: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(rename = "bestMatch")]
    pub best_match: CameraId,
    #[serde(rename = "heatmapData")]
    pub heatmap_data: Vec<HeatPoint>,
}

/// Map distances onto `[0, 1]`, nearest = 1.
///
/// Missing or NaN distances get no intensity and do not move the range. When
/// every known distance is equal there is no range, so nothing gets one.
pub fn heatmap_intensities(distances: &[Option<f64>]) -> Vec<Option<f64>> {
    let known = || distances.iter().flatten().copied().filter(|d| !d.is_nan());
    let max = known().fold(f64::NEG_INFINITY, f64::max);
    let min = known().fold(f64::INFINITY, f64::min);

    distances
        .iter()
        .map(|distance| match distance {
            Some(d) if !d.is_nan() && max > min => Some((max - d) / (max - min)),
            _ => None,
        })
        .collect()
}

pub struct SearchClient {
    agent: ureq::Agent,
    workflow: RemoteWorkflow,
    store_url: String,
    store_key: String,
    table: String,
    reference_image: String,
    match_count: usize,
    match_threshold: f64,
}

impl SearchClient {
    pub fn new(
        agent: ureq::Agent,
        workflow: RemoteWorkflow,
        store_url: impl Into<String>,
        store_key: impl Into<String>,
    ) -> Self {
        Self {
            agent,
            workflow,
            store_url: store_url.into(),
            store_key: store_key.into(),
            table: DEFAULT_TABLE.to_string(),
            reference_image: DEFAULT_REFERENCE_IMAGE_URL.to_string(),
            match_count: DEFAULT_MATCH_COUNT,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_reference_image(mut self, url: impl Into<String>) -> Self {
        self.reference_image = url.into();
        self
    }

    pub fn with_matching(mut self, count: usize, threshold: f64) -> Self {
        self.match_count = count;
        self.match_threshold = threshold;
        self
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.store_url.trim_end_matches('/'), path)
    }

    /// Embed `query` with the text workflow. Requires a non-empty numeric
    /// `outputs[0].embedding`.
    pub fn embed_text(&self, query: &str) -> Result<Vec<f32>> {
        let mut inputs = Map::new();
        inputs.insert(
            "image".to_string(),
            json!({"type": "url", "value": self.reference_image}),
        );
        inputs.insert("query".to_string(), Value::String(query.to_string()));

        let outputs = self.workflow.invoke(inputs)?;
        let first = outputs
            .first()
            .ok_or_else(|| IndexerError::inference("workflow response has no outputs"))?;
        let embedding: Vec<f32> = first
            .get("embedding")
            .and_then(Value::as_array)
            .and_then(|values| {
                values
                    .iter()
                    .map(|v| v.as_f64().map(|f| f as f32))
                    .collect::<Option<Vec<f32>>>()
            })
            .ok_or_else(|| IndexerError::inference("workflow output has no numeric embedding"))?;
        if embedding.is_empty() {
            return Err(IndexerError::inference("workflow returned an empty embedding"));
        }
        Ok(embedding)
    }

    /// Rank cameras by distance to `embedding` through the store's RPC.
    pub fn match_cameras(&self, embedding: &[f32]) -> Result<Vec<CameraMatch>> {
        let request = store::authorize(
            self.agent.post(&self.rest_url(&format!("rpc/{}", MATCH_RPC))),
            &self.store_key,
        )
        .set("Content-Type", "application/json");
        let body = json!({
            "query_embedding": embedding,
            "match_threshold": self.match_threshold,
            "match_count": self.match_count,
        });
        rows(request.send_json(body), MATCH_RPC)
    }

    /// First `limit` cameras in table order, without distances.
    pub fn list_cameras(&self, limit: usize) -> Result<Vec<CameraMatch>> {
        let request = store::authorize(
            self.agent.get(&self.rest_url(&self.table)),
            &self.store_key,
        )
        .query("select", "camera_id,latitude,longitude")
        .query("limit", &limit.to_string());
        rows(request.call(), &self.table)
    }

    pub fn search(&self, query: &str) -> Result<SearchResult> {
        let embedding = self.embed_text(query)?;
        log::debug!("query {:?} embedded to {} dimensions", query, embedding.len());

        let mut cameras = self.match_cameras(&embedding)?;
        if cameras.is_empty() {
            log::info!("no cameras matched {:?}; falling back to unranked list", query);
            cameras = self.list_cameras(self.match_count)?;
        }
        let best_match = match cameras.first() {
            Some(camera) => camera.camera_id.clone(),
            None => return Err(IndexerError::Store("no cameras found in the database".into())),
        };
        log::info!("found {} cameras for {:?}", cameras.len(), query);

        let distances: Vec<Option<f64>> = cameras.iter().map(|c| c.distance).collect();
        let heatmap_data = cameras
            .iter()
            .zip(heatmap_intensities(&distances))
            .map(|(camera, intensity)| HeatPoint {
                latitude: camera.latitude,
                longitude: camera.longitude,
                intensity,
            })
            .collect();

        Ok(SearchResult {
            best_match,
            heatmap_data,
        })
    }
}

fn rows(
    result: std::result::Result<ureq::Response, ureq::Error>,
    what: &str,
) -> Result<Vec<CameraMatch>> {
    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            return Err(IndexerError::Store(format!(
                "{} returned status {}: {}",
                what,
                status,
                body_text(response)
            )))
        }
        Err(ureq::Error::Transport(transport)) => {
            return Err(IndexerError::Store(format!("{} unreachable: {}", what, transport)))
        }
    };
    let bytes = read_body(response)
        .map_err(|e| IndexerError::Store(format!("read {} response: {}", what, e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| IndexerError::Store(format!("invalid {} response: {}", what, e)))
}
