//! Reference marker recognition.
//!
//! Barcode decoding and the screen-to-world raycast happen on the device. What
//! reaches this module is the decoded payload plus the world position the
//! raycast produced, if any.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Payload carried by the printed reference QR code.
pub const DEFAULT_MARKER_PAYLOAD: &str = "ctrlF_app";

/// A decoded barcode and where it was found in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerObservation {
    /// Decoded payload string.
    pub payload: String,
    /// World position from the raycast; `None` when the raycast missed.
    #[serde(default)]
    pub position: Option<DVec3>,
}

impl MarkerObservation {
    /// Observation with a resolved world position.
    pub fn at(payload: impl Into<String>, position: DVec3) -> Self {
        Self {
            payload: payload.into(),
            position: Some(position),
        }
    }
}

/// Sentinel payload identifying the reference marker. Comparison is exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerPayload(String);

impl Default for MarkerPayload {
    fn default() -> Self {
        Self(DEFAULT_MARKER_PAYLOAD.to_string())
    }
}

impl MarkerPayload {
    /// Use a custom sentinel.
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    /// The sentinel string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `payload` identifies the reference marker.
    pub fn is_reference(&self, payload: &str) -> bool {
        payload == self.0
    }

    /// Anchor candidate for an observation.
    ///
    /// Foreign payloads and missed raycasts both yield `None`.
    pub fn anchor_position(&self, observation: &MarkerObservation) -> Option<DVec3> {
        if !self.is_reference(&observation.payload) {
            return None;
        }
        observation.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_sentinel_is_a_reference() {
        let sentinel = MarkerPayload::default();
        assert!(sentinel.is_reference("ctrlF_app"));
        assert!(!sentinel.is_reference("ctrlF app"));
        assert!(!sentinel.is_reference("CTRLF_APP"));
        assert!(!sentinel.is_reference("https://example.com"));
    }

    #[test]
    fn anchor_position_requires_sentinel_and_raycast_hit() {
        let sentinel = MarkerPayload::default();
        let hit = MarkerObservation::at("ctrlF_app", DVec3::new(0.1, 0.2, 0.3));
        assert_eq!(
            sentinel.anchor_position(&hit),
            Some(DVec3::new(0.1, 0.2, 0.3))
        );

        let miss = MarkerObservation {
            payload: "ctrlF_app".into(),
            position: None,
        };
        assert_eq!(sentinel.anchor_position(&miss), None);

        let foreign = MarkerObservation::at("menu", DVec3::ZERO);
        assert_eq!(sentinel.anchor_position(&foreign), None);
    }

    #[test]
    fn custom_sentinel_replaces_default() {
        let sentinel = MarkerPayload::new("ctrlF app");
        assert!(sentinel.is_reference("ctrlF app"));
        assert!(!sentinel.is_reference(DEFAULT_MARKER_PAYLOAD));
    }

    #[test]
    fn observation_deserializes_position_as_array() {
        let obs: MarkerObservation =
            serde_json::from_str(r#"{"payload":"ctrlF_app","position":[1.0,2.0,3.0]}"#).unwrap();
        assert_eq!(obs.position, Some(DVec3::new(1.0, 2.0, 3.0)));

        let obs: MarkerObservation = serde_json::from_str(r#"{"payload":"ctrlF_app"}"#).unwrap();
        assert_eq!(obs.position, None);
    }
}
