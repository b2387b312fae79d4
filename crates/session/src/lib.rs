#![warn(missing_docs)]
//! Session protocol around the placement engine.
//!
//! Marker detections, catalog arrival and selection changes are events.
//! A single task applies them in order and publishes placement snapshots.

mod runtime;
pub mod scene;
mod session;

pub use runtime::{spawn_session, spawn_session_with_source, SessionError, SessionHandle};
pub use scene::{
    MarkerHandle, MarkerNode, MarkerScene, SceneDiff, ScenePolicy, LABEL_SCALE, MARKER_RADIUS,
};
pub use session::{
    CatalogState, PlacementSnapshot, Session, SessionConfig, SessionEvent, SessionStatus,
};
