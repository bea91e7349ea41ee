//! Webcam Indexer
//!
//! Polls a fixed roster of traffic cameras one at a time, hands each snapshot
//! to a hosted inference workflow that computes an image embedding, and lets
//! that workflow upsert the latest embedding per camera into a remote store.
//!
//! # Module Structure
//!
//! - `roster`: camera id list loaded once at startup
//! - `scheduler`: round-robin cursor and pacing loop
//! - `pipeline`: fetch, scratch, infer, report for one camera
//! - `ingest`: snapshot acquisition over HTTP
//! - `inference`: the workflow capability and its remote client
//! - `store`: keyed upsert into the remote table, plus table seeding SQL
//! - `search`: text query -> ranked cameras and heat intensities
//! - `config`: file + environment configuration
//! - `transport`: shared HTTP agent construction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod error;
pub mod inference;
pub mod ingest;
pub mod pipeline;
pub mod roster;
pub mod scheduler;
pub mod scratch;
pub mod search;
pub mod store;
pub mod transport;

pub use config::IndexerConfig;
pub use error::{IndexerError, Result};
pub use inference::{RemoteWorkflow, Workflow, WorkflowParams};
pub use ingest::{CameraSnapshot, HttpSnapshotSource, SnapshotSource};
pub use pipeline::{AttemptOutcome, CameraPipeline};
pub use roster::{Roster, RosterEntry};
pub use scheduler::{CameraProcessor, Scheduler, SchedulerStats};
pub use scratch::ScratchFile;
pub use search::{SearchClient, SearchResult};
pub use store::{StoreClient, UpsertStatus};

/// Opaque camera identity. Stable across cycles and used as the store key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(String);

impl CameraId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CameraId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CameraId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for CameraId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Latest embedding for one camera, as written to the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub camera_id: CameraId,
    pub embedding: Vec<f32>,
    pub last_updated: DateTime<Utc>,
}

impl EmbeddingRecord {
    /// Stamp `embedding` with the current UTC time.
    pub fn now(camera_id: CameraId, embedding: Vec<f32>) -> Self {
        Self {
            camera_id,
            embedding,
            last_updated: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_record_serializes_as_store_row() {
        let record = EmbeddingRecord {
            camera_id: CameraId::new("cam-1"),
            embedding: vec![0.5, -1.0],
            last_updated: DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["camera_id"], "cam-1");
        assert_eq!(value["embedding"], serde_json::json!([0.5, -1.0]));
        assert_eq!(value["last_updated"], "2024-01-02T03:04:05Z");
    }
}
