//! Anchor resolution.
//!
//! The anchor is the world-space point where the reference marker was last
//! observed. Catalog offsets are expressed relative to it, with no rotation
//! applied (the anchor carries an identity orientation).

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// World-space origin for all relative object placements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    position: DVec3,
}

impl Anchor {
    /// Create an anchor at `position`.
    pub const fn new(position: DVec3) -> Self {
        Self { position }
    }

    /// World-space position of the anchor.
    pub const fn position(&self) -> DVec3 {
        self.position
    }

    /// Convert an anchor-relative offset into a world position.
    pub fn resolve(&self, offset: DVec3) -> DVec3 {
        self.position + offset
    }
}

/// Whether an anchor has been established for the session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AnchorState {
    /// No marker has been observed yet (or the anchor was reset).
    #[default]
    NotReady,
    /// The most recently accepted anchor.
    Ready(Anchor),
}

impl AnchorState {
    /// The anchor, if one is established.
    pub fn anchor(&self) -> Option<&Anchor> {
        match self {
            Self::NotReady => None,
            Self::Ready(anchor) => Some(anchor),
        }
    }

    /// Returns true once an anchor is established.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// How re-detections of the marker affect an existing anchor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnchorPolicy {
    /// Last detection wins, unconditionally.
    #[default]
    Overwrite,
    /// Re-detections closer than `meters` to the current anchor are treated
    /// as tracking jitter and ignored.
    MinDisplacement {
        /// Minimum distance (in meters) a re-detection must move the anchor.
        meters: f64,
    },
}

/// Outcome of feeding one detection into the [`AnchorResolver`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorUpdate {
    /// Nothing was detected; state untouched.
    Unchanged,
    /// First anchor of the session.
    Set(Anchor),
    /// An existing anchor was replaced.
    Replaced {
        /// Anchor before the update.
        previous: Anchor,
        /// Anchor after the update.
        current: Anchor,
    },
    /// The detection was rejected by [`AnchorPolicy::MinDisplacement`].
    Ignored {
        /// Distance between the detection and the current anchor.
        distance: f64,
    },
}

impl AnchorUpdate {
    /// Returns true when the stored anchor changed and placements need to be
    /// recomputed.
    pub fn changed(&self) -> bool {
        matches!(self, Self::Set(_) | Self::Replaced { .. })
    }
}

/// Holds the session anchor and applies the [`AnchorPolicy`] to detections.
#[derive(Debug, Clone, Default)]
pub struct AnchorResolver {
    state: AnchorState,
    policy: AnchorPolicy,
}

impl AnchorResolver {
    /// Create a resolver with no anchor.
    pub fn new(policy: AnchorPolicy) -> Self {
        Self {
            state: AnchorState::NotReady,
            policy,
        }
    }

    /// Current anchor state.
    pub fn state(&self) -> &AnchorState {
        &self.state
    }

    /// Record a marker detection.
    ///
    /// `None` (and non-finite positions) mean "no detection" and leave the
    /// state untouched.
    pub fn record_anchor(&mut self, position: Option<DVec3>) -> AnchorUpdate {
        let Some(position) = position.filter(|p| p.is_finite()) else {
            return AnchorUpdate::Unchanged;
        };
        let current = Anchor::new(position);

        match self.state {
            AnchorState::NotReady => {
                self.state = AnchorState::Ready(current);
                AnchorUpdate::Set(current)
            }
            AnchorState::Ready(previous) => {
                if let AnchorPolicy::MinDisplacement { meters } = self.policy {
                    let distance = previous.position().distance(position);
                    if distance < meters {
                        return AnchorUpdate::Ignored { distance };
                    }
                }
                self.state = AnchorState::Ready(current);
                AnchorUpdate::Replaced { previous, current }
            }
        }
    }

    /// Clear the anchor. Returns true if one was set.
    pub fn reset(&mut self) -> bool {
        let was_ready = self.state.is_ready();
        self.state = AnchorState::NotReady;
        was_ready
    }
}
