//! The host container the editor is mounted in.

use canvas::viewport::{BoundingBox, Transform};

/// Where the scene is displayed: supplies the container geometry used for
/// pointer conversion and receives every recomputed transform.
pub trait Host {
    fn bounding_box(&self) -> BoundingBox;
    fn apply_transform(&mut self, transform: &Transform);
}

/// Host with a fixed bounding box that keeps the transforms it was given.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    bounds: BoundingBox,
    applied: Vec<Transform>,
}

impl HeadlessHost {
    #[must_use]
    pub fn new(bounds: BoundingBox) -> Self {
        Self { bounds, applied: Vec::new() }
    }

    pub fn set_bounds(&mut self, bounds: BoundingBox) {
        self.bounds = bounds;
    }

    #[must_use]
    pub fn applied(&self) -> &[Transform] {
        &self.applied
    }

    #[must_use]
    pub fn current(&self) -> Option<&Transform> {
        self.applied.last()
    }
}

impl Host for HeadlessHost {
    fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }

    fn apply_transform(&mut self, transform: &Transform) {
        self.applied.push(*transform);
    }
}
