//! Object placement: anchor + catalog + selection -> world positions.
//!
//! [`place`] is pure. Calling it every frame with unchanged inputs yields the
//! same output, so callers are free to recompute instead of caching.

use crate::anchor::AnchorState;
use crate::catalog::{name_key, Catalog, CatalogEntry, DuplicatePolicy};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::trace;

/// Vertical distance between an object's marker and its floating label.
pub const LABEL_OFFSET_Y: f64 = 0.2;

/// Which catalog entries the caller wants placed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Place every catalog entry.
    #[default]
    All,
    /// Place only entries whose name matches, case-insensitively.
    Named(String),
}

impl Selection {
    /// Build a selection from an optional search term.
    ///
    /// Blank terms count as "no selection" and place everything.
    pub fn from_search(term: Option<&str>) -> Self {
        match term.map(str::trim) {
            Some(term) if !term.is_empty() => Self::Named(term.to_string()),
            _ => Self::All,
        }
    }

    /// The selected name, if filtering is active.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Named(name) => Some(name),
        }
    }

    /// Whether an entry called `name` passes this selection.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(selected) => name_key(selected) == name_key(name),
        }
    }
}

/// Where to draw one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementInstruction {
    /// Catalog name of the object.
    pub name: String,
    /// Absolute world position of the object's marker.
    pub world_position: DVec3,
}

impl PlacementInstruction {
    /// Position of the billboard label, [`LABEL_OFFSET_Y`] above the marker.
    pub fn label_position(&self) -> DVec3 {
        let p = self.world_position;
        DVec3::new(p.x, p.y + LABEL_OFFSET_Y, p.z)
    }
}

/// Compute placements for the entries passing `selection`.
///
/// Returns an empty list while the anchor is [`AnchorState::NotReady`]; that
/// is the normal "cannot place yet" state, not an error. Output follows
/// catalog order.
pub fn place(
    anchor: &AnchorState,
    catalog: &Catalog,
    selection: &Selection,
    duplicates: DuplicatePolicy,
) -> Vec<PlacementInstruction> {
    let Some(anchor) = anchor.anchor() else {
        return Vec::new();
    };

    let mut seen: HashSet<String> = HashSet::new();
    catalog
        .iter()
        .filter(|entry| selection.matches(entry.name()))
        .filter(|entry| match duplicates {
            DuplicatePolicy::PlaceAll => true,
            DuplicatePolicy::FirstMatch => seen.insert(name_key(entry.name())),
        })
        .map(|entry: &CatalogEntry| {
            let instruction = PlacementInstruction {
                name: entry.name().to_string(),
                world_position: anchor.resolve(entry.offset()),
            };
            trace!(
                name = %instruction.name,
                position = ?instruction.world_position,
                "placed object"
            );
            instruction
        })
        .collect()
}
