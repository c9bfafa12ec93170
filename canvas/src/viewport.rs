//! Viewport: pan/zoom state and conversions between host and scene space.
//!
//! The contents layer is positioned with its origin at the visual center of
//! the host container, then transformed by "translate (-x, -y), scale s".
//! A scene point `p` therefore lands at `center + s * p - (x, y)` in host
//! space, and every conversion here is derived from that one mapping.
//!
//! Every mutation returns the recomputed [`Transform`] so callers can push it
//! to the host without a separate query.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SCALE, MIN_PAN_SPEED, MIN_SCALE, PAN_SPEED_COMPRESSION, ZOOM_WHEEL_DIVISOR};
use crate::input::{EventDisposition, WheelEvent};

/// A point in host or scene space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// On-screen geometry of the host container, in host space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Visual center; the origin of the contents layer.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Transform applied to the contents layer: translate by `(translate_x,
/// translate_y)`, then scale uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
}

impl Transform {
    /// CSS form, e.g. `translate(-10px, 0px) scale(1.5)`.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            positive_zero(self.translate_x),
            positive_zero(self.translate_y),
            positive_zero(self.scale)
        )
    }

    /// 2-D affine matrix `[a, b, c, d, e, f]` in CSS `matrix()` order.
    #[must_use]
    pub fn matrix(&self) -> [f64; 6] {
        [self.scale, 0.0, 0.0, self.scale, self.translate_x, self.translate_y]
    }

    /// Map a contents-local point to its offset from the container center.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.translate_x, p.y * self.scale + self.translate_y)
    }

    /// Inverse of [`Transform::apply`].
    #[must_use]
    pub fn invert(&self, p: Point) -> Point {
        Point::new((p.x - self.translate_x) / self.scale, (p.y - self.translate_y) / self.scale)
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// `-0.0 + 0.0 == +0.0`, so negated zero pans print as `0px`.
fn positive_zero(v: f64) -> f64 {
    v + 0.0
}

#[derive(Debug, thiserror::Error)]
pub enum ViewportError {
    #[error("scale must be finite and positive, got {0}")]
    InvalidScale(f64),
}

/// Pure transform for a given pan and scale.
#[must_use]
pub fn compute_transform(x: f64, y: f64, scale: f64) -> Transform {
    Transform { translate_x: -x, translate_y: -y, scale }
}

/// Scene units panned per wheel pixel at `scale`.
///
/// `1 / scale`, floored at [`MIN_PAN_SPEED`] so deep zoom still moves, and
/// compressed above 1 so far-out zoom does not fling the view.
#[must_use]
pub fn pan_speed(scale: f64) -> f64 {
    let mut speed = 1.0 / scale;
    if speed < MIN_PAN_SPEED {
        speed = MIN_PAN_SPEED;
    }
    if speed > 1.0 {
        speed = (speed - 1.0) * PAN_SPEED_COMPRESSION + 1.0;
    }
    speed
}

/// Result of one wheel event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelOutcome {
    pub transform: Transform,
    pub disposition: EventDisposition,
}

/// Pan/zoom state of the editor surface.
#[derive(Debug, Clone)]
pub struct Viewport {
    x: f64,
    y: f64,
    scale: f64,
    mouse: Point,
    transform: Transform,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, scale: 1.0, mouse: Point::default(), transform: compute_transform(0.0, 0.0, 1.0) }
    }
}

impl Viewport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Queries ---

    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Scene-space pointer position from the latest pointer or wheel event.
    #[must_use]
    pub fn mouse(&self) -> Point {
        self.mouse
    }

    /// The transform for the current state.
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    // --- Setters ---

    pub fn set_x(&mut self, value: f64) -> Transform {
        self.x = value;
        self.recompute()
    }

    pub fn set_y(&mut self, value: f64) -> Transform {
        self.y = value;
        self.recompute()
    }

    pub fn set_pan(&mut self, x: f64, y: f64) -> Transform {
        self.x = x;
        self.y = y;
        self.recompute()
    }

    /// # Errors
    ///
    /// Returns [`ViewportError::InvalidScale`] for zero, negative or non-finite values.
    /// The viewport is left unchanged.
    pub fn set_scale(&mut self, value: f64) -> Result<Transform, ViewportError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ViewportError::InvalidScale(value));
        }
        self.scale = value;
        Ok(self.recompute())
    }

    fn recompute(&mut self) -> Transform {
        self.transform = compute_transform(self.x, self.y, self.scale);
        self.transform
    }

    // --- Coordinates ---

    /// Convert a host-space position to scene space without touching state.
    #[must_use]
    pub fn host_to_scene(&self, client: Point, bounds: &BoundingBox) -> Point {
        let center = bounds.center();
        // Exact inverse, (client - center + x) / scale; subtracting x instead breaks zoom-to-pointer once panned.
        self.transform.invert(Point::new(client.x - center.x, client.y - center.y))
    }

    /// Convert a scene-space position to host space.
    #[must_use]
    pub fn scene_to_host(&self, scene: Point, bounds: &BoundingBox) -> Point {
        let center = bounds.center();
        let offset = self.transform.apply(scene);
        Point::new(center.x + offset.x, center.y + offset.y)
    }

    /// Recompute and store the scene-space pointer position.
    pub fn update_mouse_position(&mut self, client: Point, bounds: &BoundingBox) -> Point {
        self.mouse = self.host_to_scene(client, bounds);
        self.mouse
    }

    // --- Gestures ---

    /// Zoom keeping the scene point under the pointer fixed on screen.
    ///
    /// Uses the stored mouse position, which must have been computed at the
    /// scale in effect before this call.
    pub fn zoom_at_pointer(&mut self, delta_y: f64) -> Transform {
        let old_scale = self.scale;
        let scaled = old_scale - (delta_y / ZOOM_WHEEL_DIVISOR) * old_scale;
        self.scale = scaled.clamp(MIN_SCALE, MAX_SCALE);
        let shrink = old_scale - self.scale;
        self.x -= self.mouse.x * shrink;
        self.y -= self.mouse.y * shrink;
        self.recompute()
    }

    /// Pan by a wheel delta, scaled by [`pan_speed`].
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Transform {
        let speed = pan_speed(self.scale);
        self.x += dx * speed;
        self.y += dy * speed;
        self.recompute()
    }

    /// Wheel handling: ctrl+wheel zooms to the pointer, plain wheel pans.
    /// Both consume the event.
    pub fn on_wheel(&mut self, event: &WheelEvent, bounds: &BoundingBox) -> WheelOutcome {
        self.update_mouse_position(event.client, bounds);
        let transform = if event.modifiers.precision_zoom() {
            self.zoom_at_pointer(event.delta.dy)
        } else {
            self.pan_by(event.delta.dx, event.delta.dy)
        };
        WheelOutcome { transform, disposition: EventDisposition::PreventDefault }
    }
}
