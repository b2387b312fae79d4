//! Marker scene: the render-facing set of placed objects.
//!
//! Each placed object becomes a [`MarkerNode`] (a small sphere plus a
//! billboard label above it). The renderer owns the actual scene graph; this
//! type tracks which nodes exist and reports what changed per recompute.

use ctrlf_core::{name_key, PlacementInstruction};
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable handle for a marker node, valid until the node is removed.
pub type MarkerHandle = u64;

/// Radius of the marker sphere, in meters.
pub const MARKER_RADIUS: f64 = 0.05;

/// Uniform scale applied to label text geometry.
pub const LABEL_SCALE: f64 = 0.02;

/// How recomputed placements are applied to existing nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenePolicy {
    /// Drop every node and recreate from scratch.
    Rebuild,
    /// Keep nodes whose name survives, moving them if needed.
    #[default]
    UpdateInPlace,
}

/// One placed object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerNode {
    /// Handle for renderer bookkeeping.
    pub handle: MarkerHandle,
    /// Object name shown on the label.
    pub name: String,
    /// Marker sphere center.
    pub position: DVec3,
    /// Label anchor point.
    pub label_position: DVec3,
    /// Marker sphere radius, in meters.
    pub radius: f64,
    /// Scale of the billboard label text.
    pub label_scale: f64,
}

/// Changes produced by one [`MarkerScene::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SceneDiff {
    /// Newly created nodes.
    pub added: Vec<MarkerHandle>,
    /// Existing nodes whose position changed.
    pub moved: Vec<MarkerHandle>,
    /// Nodes that no longer exist.
    pub removed: Vec<MarkerHandle>,
}

impl SceneDiff {
    /// Returns true if the scene did not change.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.moved.is_empty() && self.removed.is_empty()
    }
}

/// Folded name plus occurrence index, so duplicate names get distinct nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SceneKey {
    name: String,
    occurrence: usize,
}

/// Tracks marker nodes across placement recomputes.
#[derive(Debug, Clone)]
pub struct MarkerScene {
    policy: ScenePolicy,
    nodes: Vec<(SceneKey, MarkerNode)>,
    next_handle: MarkerHandle,
}

impl MarkerScene {
    /// Empty scene applying `policy`.
    pub fn new(policy: ScenePolicy) -> Self {
        Self {
            policy,
            nodes: Vec::new(),
            next_handle: 1,
        }
    }

    /// Nodes in placement order.
    pub fn nodes(&self) -> impl Iterator<Item = &MarkerNode> {
        self.nodes.iter().map(|(_, node)| node)
    }

    /// First node whose name matches case-insensitively.
    pub fn get(&self, name: &str) -> Option<&MarkerNode> {
        let key = name_key(name);
        self.nodes
            .iter()
            .find(|(k, _)| k.name == key)
            .map(|(_, node)| node)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bring the scene in line with `instructions`.
    pub fn apply(&mut self, instructions: &[PlacementInstruction]) -> SceneDiff {
        match self.policy {
            ScenePolicy::Rebuild => self.rebuild(instructions),
            ScenePolicy::UpdateInPlace => self.update_in_place(instructions),
        }
    }

    /// Remove every node.
    pub fn clear(&mut self) -> SceneDiff {
        SceneDiff {
            removed: self.nodes.drain(..).map(|(_, node)| node.handle).collect(),
            ..SceneDiff::default()
        }
    }

    fn rebuild(&mut self, instructions: &[PlacementInstruction]) -> SceneDiff {
        let mut diff = self.clear();
        for (key, instruction) in keyed(instructions) {
            let node = self.spawn(instruction);
            diff.added.push(node.handle);
            self.nodes.push((key, node));
        }
        diff
    }

    fn update_in_place(&mut self, instructions: &[PlacementInstruction]) -> SceneDiff {
        let mut previous: HashMap<SceneKey, MarkerNode> = self.nodes.drain(..).collect();
        let mut diff = SceneDiff::default();

        for (key, instruction) in keyed(instructions) {
            let node = match previous.remove(&key) {
                Some(mut node) => {
                    if node.position != instruction.world_position {
                        node.position = instruction.world_position;
                        node.label_position = instruction.label_position();
                        diff.moved.push(node.handle);
                    }
                    node.name.clone_from(&instruction.name);
                    node
                }
                None => {
                    let node = self.spawn(instruction);
                    diff.added.push(node.handle);
                    node
                }
            };
            self.nodes.push((key, node));
        }

        diff.removed = previous.into_values().map(|node| node.handle).collect();
        diff.removed.sort_unstable();
        diff
    }

    fn spawn(&mut self, instruction: &PlacementInstruction) -> MarkerNode {
        let handle = self.next_handle;
        self.next_handle += 1;
        MarkerNode {
            handle,
            name: instruction.name.clone(),
            position: instruction.world_position,
            label_position: instruction.label_position(),
            radius: MARKER_RADIUS,
            label_scale: LABEL_SCALE,
        }
    }
}

fn keyed(
    instructions: &[PlacementInstruction],
) -> impl Iterator<Item = (SceneKey, &PlacementInstruction)> {
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    instructions.iter().map(move |instruction| {
        let name = name_key(&instruction.name);
        let count = occurrences.entry(name.clone()).or_insert(0);
        let key = SceneKey {
            name,
            occurrence: *count,
        };
        *count += 1;
        (key, instruction)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlf_core::LABEL_OFFSET_Y;

    fn at(name: &str, x: f64, y: f64, z: f64) -> PlacementInstruction {
        PlacementInstruction {
            name: name.into(),
            world_position: DVec3::new(x, y, z),
        }
    }

    #[test]
    fn update_in_place_moves_existing_nodes() {
        let mut scene = MarkerScene::new(ScenePolicy::UpdateInPlace);
        let first = scene.apply(&[at("Keys", 0.5, 0.0, -1.0)]);
        assert_eq!(first.added, vec![1]);

        let second = scene.apply(&[at("Keys", 1.5, 1.0, 0.0)]);
        assert_eq!(
            second,
            SceneDiff {
                added: vec![],
                moved: vec![1],
                removed: vec![],
            }
        );
        assert_eq!(scene.len(), 1);
        let node = scene.get("keys").expect("node kept");
        assert_eq!(node.handle, 1);
        assert_eq!(node.position, DVec3::new(1.5, 1.0, 0.0));
        assert_eq!(node.label_position, DVec3::new(1.5, 1.0 + LABEL_OFFSET_Y, 0.0));
        assert_eq!(node.radius, MARKER_RADIUS);
        assert_eq!(node.label_scale, LABEL_SCALE);
    }

    #[test]
    fn update_in_place_is_quiet_when_nothing_changes() {
        let mut scene = MarkerScene::new(ScenePolicy::UpdateInPlace);
        scene.apply(&[at("cup", 1.0, 0.0, 0.0)]);
        assert!(scene.apply(&[at("cup", 1.0, 0.0, 0.0)]).is_empty());
    }

    #[test]
    fn update_in_place_adds_and_removes() {
        let mut scene = MarkerScene::new(ScenePolicy::UpdateInPlace);
        scene.apply(&[at("cup", 0.0, 0.0, 0.0), at("keys", 1.0, 0.0, 0.0)]);

        let diff = scene.apply(&[at("keys", 1.0, 0.0, 0.0), at("book", 2.0, 0.0, 0.0)]);
        assert_eq!(diff.added, vec![3]);
        assert!(diff.moved.is_empty());
        assert_eq!(diff.removed, vec![1]);

        let names: Vec<_> = scene.nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["keys", "book"]);
    }

    #[test]
    fn duplicate_names_get_distinct_nodes() {
        let mut scene = MarkerScene::new(ScenePolicy::UpdateInPlace);
        let diff = scene.apply(&[at("keys", 0.0, 0.0, 0.0), at("Keys", 1.0, 0.0, 0.0)]);
        assert_eq!(diff.added, vec![1, 2]);

        let diff = scene.apply(&[at("keys", 0.0, 0.0, 0.0), at("Keys", 2.0, 0.0, 0.0)]);
        assert_eq!(diff.moved, vec![2]);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn rebuild_replaces_every_node() {
        let mut scene = MarkerScene::new(ScenePolicy::Rebuild);
        scene.apply(&[at("cup", 0.0, 0.0, 0.0)]);
        let diff = scene.apply(&[at("cup", 0.0, 0.0, 0.0)]);
        assert_eq!(diff.removed, vec![1]);
        assert_eq!(diff.added, vec![2]);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn clear_removes_everything() {
        let mut scene = MarkerScene::new(ScenePolicy::UpdateInPlace);
        scene.apply(&[at("cup", 0.0, 0.0, 0.0), at("keys", 0.0, 0.0, 0.0)]);
        let diff = scene.clear();
        assert_eq!(diff.removed, vec![1, 2]);
        assert!(scene.is_empty());
    }
}
