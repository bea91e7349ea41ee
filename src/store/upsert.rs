//! Keyed upsert against a PostgREST-style endpoint.
//!
//! `POST <url>/rest/v1/<table>?on_conflict=camera_id` with a one-row array and
//! `Prefer: resolution=merge-duplicates`, so a second write for the same camera
//! replaces the first. A rejected write is reported in-band as a status string,
//! never as an error; only an unreachable store is an error.

use serde_json::{json, Value};

use crate::error::{IndexerError, Result};
use crate::transport::body_text;
use crate::EmbeddingRecord;

pub const DEFAULT_TABLE: &str = "cameras";
const CONFLICT_KEY: &str = "camera_id";
const PREFER: &str = "resolution=merge-duplicates,return=representation";

/// Result of one upsert as the workflow reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpsertStatus {
    Updated,
    Rejected { status: u16, body: String },
}

impl UpsertStatus {
    pub fn message(&self) -> String {
        match self {
            UpsertStatus::Updated => "Successfully updated the database!".to_string(),
            UpsertStatus::Rejected { status, body } => {
                format!("Error upserting data:{}{}", status, body)
            }
        }
    }

    /// `{"status": ...}`, the shape the workflow block returns.
    pub fn to_block_output(&self) -> Value {
        json!({ "status": self.message() })
    }
}

pub struct StoreClient {
    agent: ureq::Agent,
    url: String,
    key: String,
    table: String,
}

impl StoreClient {
    pub fn new(agent: ureq::Agent, url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            agent,
            url: url.into(),
            key: key.into(),
            table: DEFAULT_TABLE.to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/rest/v1/{}?on_conflict={}",
            self.url.trim_end_matches('/'),
            self.table,
            CONFLICT_KEY
        )
    }

    /// Insert or replace the row for `record.camera_id`.
    pub fn upsert(&self, record: &EmbeddingRecord) -> Result<UpsertStatus> {
        let rows = json!([record]);
        let result = super::authorize(self.agent.post(&self.endpoint()), &self.key)
            .set("Content-Type", "application/json")
            .set("Prefer", PREFER)
            .send_json(rows);

        match result {
            Ok(response) if response.status() < 300 => Ok(UpsertStatus::Updated),
            Ok(response) => Ok(UpsertStatus::Rejected {
                status: response.status(),
                body: body_text(response),
            }),
            Err(ureq::Error::Status(status, response)) => {
                let body = body_text(response);
                log::warn!(
                    "store rejected upsert for camera {}: status {}",
                    record.camera_id,
                    status
                );
                Ok(UpsertStatus::Rejected { status, body })
            }
            Err(ureq::Error::Transport(transport)) => Err(IndexerError::Store(format!(
                "upsert for camera {} failed: {}",
                record.camera_id, transport
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn endpoint_names_conflict_key() {
        let client = StoreClient::new(
            crate::transport::http_agent(Duration::from_secs(1)),
            "https://proj.supabase.co/",
            "k",
        );
        assert_eq!(
            client.endpoint(),
            "https://proj.supabase.co/rest/v1/cameras?on_conflict=camera_id"
        );
        assert_eq!(
            client.with_table("webcams").endpoint(),
            "https://proj.supabase.co/rest/v1/webcams?on_conflict=camera_id"
        );
    }

    #[test]
    fn rejected_status_message_embeds_status_and_body() {
        let status = UpsertStatus::Rejected {
            status: 409,
            body: "{\"code\":\"23505\"}".to_string(),
        };
        assert_eq!(status.message(), "Error upserting data:409{\"code\":\"23505\"}");
        assert_eq!(
            UpsertStatus::Updated.to_block_output(),
            json!({"status": "Successfully updated the database!"})
        );
    }
}
