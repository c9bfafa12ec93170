//! Shared numeric constants for the canvas crate.

// ── Zoom ────────────────────────────────────────────────────────

/// Wheel delta that shrinks the scale by 100% in one step; smaller deltas zoom proportionally.
pub const ZOOM_WHEEL_DIVISOR: f64 = 500.0;

/// Smallest scale wheel zoom will reach.
pub const MIN_SCALE: f64 = 0.01;

/// Largest scale wheel zoom will reach.
pub const MAX_SCALE: f64 = 100.0;

// ── Pan ─────────────────────────────────────────────────────────

/// Floor on the scene units panned per wheel pixel when zoomed in.
pub const MIN_PAN_SPEED: f64 = 0.1;

/// Compression applied to pan speed above 1 when zoomed out.
pub const PAN_SPEED_COMPRESSION: f64 = 0.01;

// ── Text rendering ──────────────────────────────────────────────

/// Upper bound for the autosized font, in pixels.
pub const MAX_FONT_SIZE: u32 = 100;

/// Surface size used when an item does not carry `width` / `height`.
pub const DEFAULT_SURFACE_WIDTH: f64 = 200.0;
pub const DEFAULT_SURFACE_HEIGHT: f64 = 50.0;

pub const TEXT_FILL: &str = "red";
pub const TEXT_OUTLINE: &str = "white";
pub const TEXT_OUTLINE_WIDTH: f64 = 2.0;
pub const GUIDE_LINE_WIDTH: f64 = 1.0;
