//! HTTP snapshot source.
//!
//! Fetches `GET <template with {} replaced by camera id>` and returns the raw
//! body. Redirects are followed by the agent; the final status must be 2xx.

use super::{CameraSnapshot, SnapshotSource};
use crate::error::{IndexerError, Result};
use crate::transport::read_body;
use crate::CameraId;

pub const DEFAULT_SNAPSHOT_URL_TEMPLATE: &str = "https://webcams.nyctmc.org/api/cameras/{}/image";

pub struct HttpSnapshotSource {
    agent: ureq::Agent,
    url_template: String,
}

impl HttpSnapshotSource {
    pub fn new(agent: ureq::Agent, url_template: impl Into<String>) -> Self {
        Self {
            agent,
            url_template: url_template.into(),
        }
    }

    /// Snapshot URL for `camera_id`.
    pub fn url_for(&self, camera_id: &CameraId) -> String {
        self.url_template.replace("{}", camera_id.as_str())
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn fetch(&self, camera_id: &CameraId) -> Result<CameraSnapshot> {
        let url = self.url_for(camera_id);
        let response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(IndexerError::ImageStatus {
                    camera_id: camera_id.to_string(),
                    status,
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(IndexerError::ImageTransport {
                    camera_id: camera_id.to_string(),
                    reason: transport.to_string(),
                })
            }
        };

        // ureq only raises for >= 400; 1xx/3xx that reach us are still failures
        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(IndexerError::ImageStatus {
                camera_id: camera_id.to_string(),
                status,
            });
        }

        let bytes = read_body(response).map_err(|e| IndexerError::ImageTransport {
            camera_id: camera_id.to_string(),
            reason: format!("read snapshot body: {}", e),
        })?;
        Ok(CameraSnapshot {
            camera_id: camera_id.clone(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn template_is_filled_with_camera_id() {
        let source = HttpSnapshotSource::new(
            crate::transport::http_agent(Duration::from_secs(1)),
            DEFAULT_SNAPSHOT_URL_TEMPLATE,
        );
        assert_eq!(
            source.url_for(&CameraId::new("abc-123")),
            "https://webcams.nyctmc.org/api/cameras/abc-123/image"
        );
    }
}
