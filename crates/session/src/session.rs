//! Session state and the recompute rule.
//!
//! [`Session`] is the single owner of anchor, catalog and selection. Every
//! mutation goes through [`Session::apply`]; placements are recomputed after
//! any relevant event once both an anchor and a catalog exist.

use crate::scene::{MarkerScene, SceneDiff, ScenePolicy};
use ctrlf_core::{
    place, AnchorPolicy, AnchorResolver, AnchorState, AnchorUpdate, Catalog, DuplicatePolicy,
    MarkerObservation, MarkerPayload, PlacementInstruction, Selection,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Inputs to the session, in the order they were observed.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A barcode was decoded in a camera frame.
    AnchorObserved(MarkerObservation),
    /// The catalog fetch completed (empty on failure).
    CatalogLoaded(Catalog),
    /// The user picked a different object (or cleared the search).
    SelectionChanged(Selection),
    /// Forget the anchor, e.g. when the AR screen is left.
    Reset,
}

/// Tunables for a session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Payload identifying the reference marker.
    pub marker: MarkerPayload,
    /// How repeated object names are placed.
    pub duplicate_policy: DuplicatePolicy,
    /// How recomputes are applied to existing markers.
    pub scene_policy: ScenePolicy,
    /// What re-detections do to an existing anchor.
    pub anchor_policy: AnchorPolicy,
}

/// Catalog availability.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CatalogState {
    /// Fetch still in flight.
    #[default]
    Pending,
    /// Fetch completed.
    Loaded(Catalog),
}

impl CatalogState {
    /// The catalog, once loaded.
    pub fn catalog(&self) -> Option<&Catalog> {
        match self {
            Self::Pending => None,
            Self::Loaded(catalog) => Some(catalog),
        }
    }
}

/// Result of a recompute, published to renderers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlacementSnapshot {
    /// Increments on every recompute; 0 means nothing computed yet.
    pub revision: u64,
    /// Placements in catalog order.
    pub instructions: Vec<PlacementInstruction>,
    /// Scene changes relative to the previous revision.
    pub diff: SceneDiff,
}

/// Point-in-time summary of session state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    /// Current anchor.
    pub anchor: AnchorState,
    /// Catalog entry count, `None` while the fetch is pending.
    pub catalog_entries: Option<usize>,
    /// Distinct catalog names for search UIs.
    pub names: Vec<String>,
    /// Current selection.
    pub selection: Selection,
    /// Last published revision.
    pub revision: u64,
    /// Number of placed markers.
    pub placed: usize,
}

/// Session state owned by exactly one task.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    anchor: AnchorResolver,
    catalog: CatalogState,
    selection: Selection,
    scene: MarkerScene,
    revision: u64,
}

impl Session {
    /// Fresh session: no anchor, catalog pending, everything selected.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            anchor: AnchorResolver::new(config.anchor_policy),
            scene: MarkerScene::new(config.scene_policy),
            catalog: CatalogState::Pending,
            selection: Selection::All,
            revision: 0,
            config,
        }
    }

    /// Current anchor.
    pub fn anchor(&self) -> &AnchorState {
        self.anchor.state()
    }

    /// Catalog availability.
    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    /// Current selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Placed markers.
    pub fn scene(&self) -> &MarkerScene {
        &self.scene
    }

    /// Both prerequisites for placement have arrived.
    pub fn is_ready(&self) -> bool {
        self.anchor.state().is_ready() && self.catalog.catalog().is_some()
    }

    /// Placements for the current state, without touching the scene.
    pub fn placements(&self) -> Vec<PlacementInstruction> {
        match self.catalog.catalog() {
            Some(catalog) => place(
                self.anchor.state(),
                catalog,
                &self.selection,
                self.config.duplicate_policy,
            ),
            None => Vec::new(),
        }
    }

    /// Summary for status queries.
    pub fn status(&self) -> SessionStatus {
        let catalog = self.catalog.catalog();
        SessionStatus {
            anchor: *self.anchor.state(),
            catalog_entries: catalog.map(Catalog::len),
            names: catalog.map(Catalog::names).unwrap_or_default(),
            selection: self.selection.clone(),
            revision: self.revision,
            placed: self.scene.len(),
        }
    }

    /// Apply one event. Returns a snapshot when placements were recomputed.
    pub fn apply(&mut self, event: SessionEvent) -> Option<PlacementSnapshot> {
        let relevant = match event {
            SessionEvent::AnchorObserved(observation) => self.observe_marker(&observation),
            SessionEvent::CatalogLoaded(catalog) => {
                info!(entries = catalog.len(), "Catalog loaded");
                self.catalog = CatalogState::Loaded(catalog);
                true
            }
            SessionEvent::SelectionChanged(selection) => {
                if selection == self.selection {
                    false
                } else {
                    info!(selection = ?selection.as_name(), "Selection changed");
                    self.selection = selection;
                    true
                }
            }
            SessionEvent::Reset => {
                if self.anchor.reset() {
                    info!("Anchor reset");
                }
                let diff = self.scene.clear();
                if diff.is_empty() {
                    return None;
                }
                return Some(self.publish(Vec::new(), diff));
            }
        };

        if !relevant || !self.is_ready() {
            return None;
        }
        Some(self.recompute())
    }

    fn observe_marker(&mut self, observation: &MarkerObservation) -> bool {
        let position = self.config.marker.anchor_position(observation);
        if position.is_none() && self.config.marker.is_reference(&observation.payload) {
            debug!("Reference marker seen without a world position");
        }

        match self.anchor.record_anchor(position) {
            AnchorUpdate::Unchanged => false,
            AnchorUpdate::Set(anchor) => {
                info!(position = ?anchor.position(), "Anchor established");
                true
            }
            AnchorUpdate::Replaced { previous, current } => {
                debug!(
                    from = ?previous.position(),
                    to = ?current.position(),
                    "Anchor replaced"
                );
                true
            }
            AnchorUpdate::Ignored { distance } => {
                debug!(distance, "Ignoring marker jitter");
                false
            }
        }
    }

    fn recompute(&mut self) -> PlacementSnapshot {
        let instructions = self.placements();
        let diff = self.scene.apply(&instructions);
        debug!(
            placed = instructions.len(),
            added = diff.added.len(),
            moved = diff.moved.len(),
            removed = diff.removed.len(),
            "Recomputed placements"
        );
        self.publish(instructions, diff)
    }

    fn publish(
        &mut self,
        instructions: Vec<PlacementInstruction>,
        diff: SceneDiff,
    ) -> PlacementSnapshot {
        self.revision += 1;
        PlacementSnapshot {
            revision: self.revision,
            instructions,
            diff,
        }
    }
}
