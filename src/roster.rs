//! Camera roster loading.
//!
//! The roster file is a JSON array of camera records. Each record may carry an
//! `id`; records without one are skipped. Anything else about the file being
//! wrong (unreadable, not JSON, not an array of objects) is a single
//! `RosterLoad` failure, which callers treat as an empty roster.

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{IndexerError, Result};
use crate::CameraId;

/// One usable record from the roster file.
#[derive(Clone, Debug, PartialEq)]
pub struct RosterEntry {
    pub id: CameraId,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Ordered, immutable list of cameras to poll.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    cameras: Vec<CameraId>,
}

impl Roster {
    pub fn new(cameras: Vec<CameraId>) -> Self {
        Self { cameras }
    }

    /// Load camera ids from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_entries(&load_entries(path)?))
    }

    /// Load camera ids from `path`, degrading any load failure to an empty roster.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(roster) => roster,
            Err(e) => {
                log::error!("error loading camera ids: {}", e);
                Self::default()
            }
        }
    }

    pub fn from_entries(entries: &[RosterEntry]) -> Self {
        Self::new(entries.iter().map(|entry| entry.id.clone()).collect())
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CameraId> {
        self.cameras.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CameraId> {
        self.cameras.iter()
    }
}

impl<S: Into<CameraId>> FromIterator<S> for Roster {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Read and parse every record in the roster file that carries an id.
pub fn load_entries(path: &Path) -> Result<Vec<RosterEntry>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| IndexerError::roster(path, format!("failed to read file: {}", e)))?;
    parse_entries(&raw).map_err(|reason| IndexerError::roster(path, reason))
}

/// Parse roster JSON text. The error string describes why the shape is wrong.
pub fn parse_entries(raw: &str) -> std::result::Result<Vec<RosterEntry>, String> {
    let value: Value = serde_json::from_str(raw).map_err(|e| format!("invalid json: {}", e))?;
    let Value::Array(records) = value else {
        return Err("json data must be a list of camera objects".to_string());
    };

    let mut entries = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let Value::Object(fields) = record else {
            return Err(format!("camera record {} is not an object", index));
        };
        if let Some(entry) = entry_from_fields(fields) {
            entries.push(entry);
        }
    }
    Ok(entries)
}

fn entry_from_fields(fields: &Map<String, Value>) -> Option<RosterEntry> {
    let id = match fields.get("id")? {
        Value::String(id) => id.clone(),
        Value::Number(id) => id.to_string(),
        // null or nested ids are treated the same as a missing id
        _ => return None,
    };
    Some(RosterEntry {
        id: CameraId::new(id),
        lat: fields.get("lat").and_then(Value::as_f64),
        lng: fields.get("lng").and_then(Value::as_f64),
    })
}
