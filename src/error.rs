use std::path::PathBuf;

use thiserror::Error;

/// Failures on the polling path.
///
/// Only `RosterLoad` ever reaches the process entry point, and even that one is
/// degraded to an empty roster. Everything else is absorbed per camera by the
/// pipeline.
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("could not load roster from {path}: {reason}")]
    RosterLoad { path: PathBuf, reason: String },

    #[error("snapshot fetch for camera {camera_id} returned status {status}")]
    ImageStatus { camera_id: String, status: u16 },

    #[error("snapshot fetch for camera {camera_id} failed: {reason}")]
    ImageTransport { camera_id: String, reason: String },

    #[error("scratch file {path}: {source}")]
    Scratch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("workflow invocation failed: {0}")]
    Inference(String),

    #[error("store request failed: {0}")]
    Store(String),
}

impl IndexerError {
    pub fn roster<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        Self::RosterLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn inference<S: Into<String>>(reason: S) -> Self {
        Self::Inference(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, IndexerError>;
