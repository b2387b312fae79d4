//! Pinhole back-projection from detector pixels to camera-space offsets.
//!
//! The object detector reports a bounding-box center in pixels plus an
//! estimated depth; these helpers turn that into the `(x, y, z)` offsets the
//! catalog stores.

use glam::{DVec2, DVec3};

/// Approximate focal length of the detection camera, in pixels.
pub const DEFAULT_FOCAL_LENGTH_PX: f64 = 600.0;

/// Minimal pinhole camera model: focal length and image size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    focal_length: f64,
    width: f64,
    height: f64,
}

impl CameraIntrinsics {
    /// Returns `None` unless every value is finite and positive.
    pub fn new(focal_length: f64, width: f64, height: f64) -> Option<Self> {
        [focal_length, width, height]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
            .then_some(Self {
                focal_length,
                width,
                height,
            })
    }

    /// Focal length in pixels.
    pub fn focal_length(&self) -> f64 {
        self.focal_length
    }

    /// Image center; the optical axis passes through it.
    pub fn principal_point(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Back-project pixel `screen` at `depth` meters.
    ///
    /// Axes follow image conventions: X grows right, Y grows down, Z is the
    /// depth along the optical axis.
    pub fn screen_to_world(&self, screen: DVec2, depth: f64) -> DVec3 {
        let centered = (screen - self.principal_point()) * depth / self.focal_length;
        DVec3::new(centered.x, centered.y, depth)
    }
}

/// Center of an `(x1, y1, x2, y2)` bounding box.
pub fn box_center(min: DVec2, max: DVec2) -> DVec2 {
    (min + max) / 2.0
}
