//! Snapshot acquisition.
//!
//! A `SnapshotSource` turns a camera id into the camera's current still image.
//! The ingestion layer is responsible for:
//! - Issuing exactly one request per attempt (no retries)
//! - Treating anything outside the 2xx range as a failed fetch
//! - Capping the amount of data buffered per snapshot
//!
//! The ingestion layer MUST NOT:
//! - Write snapshots to disk (the pipeline owns scratch files)
//! - Keep snapshots beyond handoff to the pipeline

pub mod snapshot;

pub use snapshot::{HttpSnapshotSource, DEFAULT_SNAPSHOT_URL_TEMPLATE};

use crate::error::Result;
use crate::CameraId;

/// Transient image payload for one pipeline attempt.
#[derive(Clone, Debug)]
pub struct CameraSnapshot {
    pub camera_id: CameraId,
    pub bytes: Vec<u8>,
}

/// Where snapshots come from.
pub trait SnapshotSource {
    /// Fetch the current image for `camera_id`.
    ///
    /// A non-2xx response is reported as `IndexerError::ImageStatus`.
    fn fetch(&self, camera_id: &CameraId) -> Result<CameraSnapshot>;
}

impl<T: SnapshotSource + ?Sized> SnapshotSource for &T {
    fn fetch(&self, camera_id: &CameraId) -> Result<CameraSnapshot> {
        (**self).fetch(camera_id)
    }
}
