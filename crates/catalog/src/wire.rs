//! JSON wire format of `GET /get-objects`.
//!
//! The backend returns the most recent record per object name:
//!
//! ```json
//! [{"id": 7, "name": "keys", "x": 0.5, "y": 0.0, "z": -1.0, "timestamp": "..."}]
//! ```
//!
//! `id` and `timestamp` are optional and unused for placement. A record that
//! fails to decode is skipped; only a body that is not an array fails.

use crate::error::CatalogError;
use ctrlf_core::{Catalog, CatalogEntry};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One object record as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Object name (e.g. a detector class label).
    pub name: String,
    /// Offset from the anchor along X, in meters.
    pub x: f64,
    /// Offset from the anchor along Y, in meters.
    pub y: f64,
    /// Offset from the anchor along Z, in meters.
    pub z: f64,
    /// Backend row id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Time the backend recorded the object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ObjectRecord {
    /// New record without backend bookkeeping, as posted to `/store-object`.
    pub fn new(name: impl Into<String>, offset: DVec3) -> Self {
        Self {
            name: name.into(),
            x: offset.x,
            y: offset.y,
            z: offset.z,
            id: None,
            timestamp: None,
        }
    }

    /// Offset vector of the record.
    pub fn offset(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }
}

/// Decode a `/get-objects` body into a catalog, preserving record order.
pub fn decode_catalog(body: &[u8]) -> Result<Catalog, CatalogError> {
    let values: Vec<serde_json::Value> = serde_json::from_slice(body)?;
    let total = values.len();

    let mut entries = Vec::with_capacity(total);
    for (index, value) in values.into_iter().enumerate() {
        let record = match serde_json::from_value::<ObjectRecord>(value) {
            Ok(record) => record,
            Err(err) => {
                warn!(index, %err, "Skipping malformed catalog record");
                continue;
            }
        };
        match CatalogEntry::new(record.name.clone(), record.offset()) {
            Ok(entry) => entries.push(entry),
            Err(err) => warn!(index, %err, "Skipping invalid catalog record"),
        }
    }

    debug!(total, kept = entries.len(), "Decoded catalog body");
    Ok(Catalog::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_rows_in_order() {
        let body = br#"[
            {"id": 3, "name": "keys", "x": 0.5, "y": 0, "z": -1, "timestamp": "Sat, 08 Feb 2025 10:00:00 GMT"},
            {"name": "cup", "x": 1.0, "y": 2.0, "z": 3.0}
        ]"#;
        let catalog = decode_catalog(body).expect("decodes");
        let names: Vec<_> = catalog.iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["keys", "cup"]);
        assert_eq!(catalog.entries()[0].offset(), DVec3::new(0.5, 0.0, -1.0));
    }

    #[test]
    fn skips_bad_records_but_keeps_the_rest() {
        let body = br#"[
            {"name": "keys", "x": 0.5, "y": 0, "z": -1},
            {"name": "no-z", "x": 0.5, "y": 0},
            {"name": "", "x": 0, "y": 0, "z": 0},
            {"name": 42, "x": 0, "y": 0, "z": 0},
            "not an object",
            {"name": "cup", "x": "1", "y": 0, "z": 0}
        ]"#;
        let catalog = decode_catalog(body).expect("array decodes");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries()[0].name(), "keys");
    }

    #[test]
    fn error_envelope_is_a_decode_error() {
        let body = br#"{"error": "relation \"objects\" does not exist"}"#;
        assert!(matches!(
            decode_catalog(body),
            Err(CatalogError::Decode(_))
        ));
    }

    #[test]
    fn empty_array_is_an_empty_catalog() {
        let catalog = decode_catalog(b"[]").expect("decodes");
        assert!(catalog.is_empty());
    }
}
