//! Input model: modifier keys, wheel deltas and the host events the editor consumes.
//!
//! Only pointer-move and wheel events reach the viewport. Each handler reports
//! an [`EventDisposition`] so the host knows whether to suppress its own
//! default action (native scrolling).

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::viewport::Point;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl turns the wheel into zoom-to-pointer. Trackpad pinch gestures
    /// arrive as ctrl+wheel too.
    #[must_use]
    pub fn precision_zoom(self) -> bool {
        self.ctrl
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, Default)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Pointer moved over the host container.
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    /// Pointer position in the host's screen space.
    pub client: Point,
}

/// Wheel or trackpad scroll over the host container.
#[derive(Debug, Clone, Copy)]
pub struct WheelEvent {
    /// Pointer position in the host's screen space.
    pub client: Point,
    pub delta: WheelDelta,
    pub modifiers: Modifiers,
}

/// What the host should do with its native handling of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Let the host run its default action.
    Default,
    /// The event was consumed; suppress the default action.
    PreventDefault,
}
