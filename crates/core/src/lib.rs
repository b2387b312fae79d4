#![warn(missing_docs)]
//! Core primitives for anchor-relative object placement.
//!
//! Everything in this crate is synchronous and free of I/O. The session crate
//! drives these types from its event loop; the catalog crate produces
//! [`Catalog`] values from the backend.

pub mod anchor;
pub mod catalog;
pub mod marker;
pub mod placement;
pub mod projection;

pub use anchor::{Anchor, AnchorPolicy, AnchorResolver, AnchorState, AnchorUpdate};
pub use catalog::{name_key, Catalog, CatalogEntry, CatalogEntryError, DuplicatePolicy};
pub use marker::{MarkerObservation, MarkerPayload, DEFAULT_MARKER_PAYLOAD};
pub use placement::{place, PlacementInstruction, Selection, LABEL_OFFSET_Y};
pub use projection::{box_center, CameraIntrinsics, DEFAULT_FOCAL_LENGTH_PX};

// Re-export so downstream crates agree on the vector type.
pub use glam::{DVec2, DVec3};
