//! Scoped scratch files for snapshots.
//!
//! The workflow client takes the snapshot by path, so each attempt writes the
//! image to `<dir>/<camera id>_image.jpg` and removes it when the `ScratchFile`
//! is dropped. The name is deterministic per camera; two live scratch files for
//! the same camera would collide, which the sequential scheduler never allows.

use std::path::{Path, PathBuf};

use crate::error::{IndexerError, Result};
use crate::CameraId;

#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Write `bytes` to the scratch slot for `camera_id` inside `dir`.
    pub fn create(dir: &Path, camera_id: &CameraId, bytes: &[u8]) -> Result<Self> {
        let path = scratch_path(dir, camera_id);
        std::fs::write(&path, bytes).map_err(|source| IndexerError::Scratch {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("failed to remove scratch file {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Scratch location for `camera_id`. Characters that could escape `dir` or are
/// awkward in file names are replaced with `_`.
pub fn scratch_path(dir: &Path, camera_id: &CameraId) -> PathBuf {
    let name: String = camera_id
        .as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{}_image.jpg", name))
}
