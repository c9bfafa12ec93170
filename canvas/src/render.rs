//! Rendering: the drawing-surface seam and the example text renderer.
//!
//! Workers never see a real raster API. They draw through [`Surface`], an
//! immediate-mode 2-D interface small enough for a browser canvas, an
//! offscreen bitmap or the [`RecordingSurface`] used in tests and demos.
//! [`ItemRenderer`] is what a worker runtime drives for one item type.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::marker::PhantomData;

use frames::{ItemId, ItemPayload};
use serde_json::Value;

use crate::consts::{
    DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH, GUIDE_LINE_WIDTH, MAX_FONT_SIZE, TEXT_FILL, TEXT_OUTLINE,
    TEXT_OUTLINE_WIDTH,
};

/// Measured extent of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f64,
    /// Distance from the baseline to the top of the glyph bounding box.
    pub ascent: f64,
}

/// Immediate-mode 2-D drawing target attached to one item.
pub trait Surface {
    fn with_size(width: f64, height: f64) -> Self
    where
        Self: Sized;
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn resize(&mut self, width: f64, height: f64);
    fn clear(&mut self);
    fn set_fill_style(&mut self, style: &str);
    fn set_stroke_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f64);
    /// CSS font shorthand, e.g. `400 12px sans-serif`.
    fn set_font(&mut self, font: &str);
    fn measure_text(&self, text: &str) -> TextMetrics;
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn stroke_text(&mut self, text: &str, x: f64, y: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("item {id} has no '{field}' field")]
    MissingField { id: ItemId, field: &'static str },
    #[error("item {id}: '{field}' must be {expected}")]
    InvalidField { id: ItemId, field: &'static str, expected: &'static str },
}

/// Draws items of one type. Runs inside a worker, so it must be `Send`.
pub trait ItemRenderer: Send + 'static {
    type Surface: Surface + Send + 'static;

    /// The item type this renderer announces.
    fn item_type(&self) -> &str;

    /// Create the surface for a newly inserted item.
    fn create_surface(&mut self, item: &ItemPayload) -> Self::Surface;

    /// Draw the merged record onto its surface.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when the record lacks what the renderer needs.
    fn render(&mut self, item: &ItemPayload, surface: &mut Self::Surface) -> Result<(), RenderError>;
}

// =============================================================================
// TEXT AUTOSIZE
// =============================================================================

/// Item type rendered by [`TextRenderer`].
pub const TEXT_ITEM_TYPE: &str = "text";

/// Renders a single line of text at the largest font size that fits the
/// surface width, outlined, centered vertically, with a midline guide.
///
/// Reads `text` (or `data.text`), and optional `width` / `height`.
#[derive(Debug)]
pub struct TextRenderer<S> {
    surface: PhantomData<fn() -> S>,
}

impl<S> Default for TextRenderer<S> {
    fn default() -> Self {
        Self { surface: PhantomData }
    }
}

impl<S> TextRenderer<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> ItemRenderer for TextRenderer<S>
where
    S: Surface + Send + 'static,
{
    type Surface = S;

    fn item_type(&self) -> &str {
        TEXT_ITEM_TYPE
    }

    fn create_surface(&mut self, item: &ItemPayload) -> S {
        let (width, height) = surface_size(item);
        S::with_size(width, height)
    }

    fn render(&mut self, item: &ItemPayload, surface: &mut S) -> Result<(), RenderError> {
        let text = text_field(item)?;
        let (width, height) = surface_size(item);
        if (surface.width() - width).abs() > f64::EPSILON || (surface.height() - height).abs() > f64::EPSILON {
            surface.resize(width, height);
        }

        surface.clear();
        surface.set_fill_style(TEXT_FILL);

        let size = fit_font_size(surface, text);
        surface.set_font(&font(size));
        let metrics = surface.measure_text(text);
        let baseline = height / 2.0 + metrics.ascent / 2.0;

        surface.set_stroke_style(TEXT_OUTLINE);
        surface.set_line_width(TEXT_OUTLINE_WIDTH);
        surface.stroke_text(text, 0.0, baseline);
        surface.fill_text(text, 0.0, baseline);

        surface.set_line_width(GUIDE_LINE_WIDTH);
        surface.stroke_rect(0.0, height / 2.0, width, 0.0);
        Ok(())
    }
}

/// Font shorthand used for a pixel size.
#[must_use]
pub fn font(size: u32) -> String {
    format!("400 {size}px sans-serif")
}

/// Grow the font one pixel at a time until the text reaches the surface
/// width; the last size that fit wins, capped at [`MAX_FONT_SIZE`].
pub fn fit_font_size<S: Surface + ?Sized>(surface: &mut S, text: &str) -> u32 {
    let mut size = 0;
    loop {
        size += 1;
        surface.set_font(&font(size));
        if surface.measure_text(text).width >= surface.width() {
            return size - 1;
        }
        if size >= MAX_FONT_SIZE {
            return MAX_FONT_SIZE;
        }
    }
}

fn text_field(item: &ItemPayload) -> Result<&str, RenderError> {
    let value = item
        .get("text")
        .or_else(|| item.get("data").and_then(|data| data.get("text")))
        .ok_or_else(|| RenderError::MissingField { id: item.id().clone(), field: "text" })?;
    value
        .as_str()
        .ok_or_else(|| RenderError::InvalidField { id: item.id().clone(), field: "text", expected: "a string" })
}

fn surface_size(item: &ItemPayload) -> (f64, f64) {
    let dimension = |key: &str, default: f64| item.get(key).and_then(Value::as_f64).filter(|v| *v > 0.0).unwrap_or(default);
    (dimension("width", DEFAULT_SURFACE_WIDTH), dimension("height", DEFAULT_SURFACE_HEIGHT))
}

// =============================================================================
// RECORDING SURFACE
// =============================================================================

/// Horizontal advance per character, as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.5;
/// Ascent as a fraction of the font size.
const GLYPH_ASCENT: f64 = 0.75;

/// One call made against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Resize { width: f64, height: f64 },
    Clear,
    FillStyle(String),
    StrokeStyle(String),
    LineWidth(f64),
    Font(String),
    FillText { text: String, x: f64, y: f64 },
    StrokeText { text: String, x: f64, y: f64 },
    StrokeRect { x: f64, y: f64, width: f64, height: f64 },
}

/// Surface that records draw calls instead of rasterizing.
///
/// Text is measured with fixed-advance glyphs, so layout is deterministic.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    font_px: f64,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the recorded commands.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Surface for RecordingSurface {
    fn with_size(width: f64, height: f64) -> Self {
        Self { width, height, font_px: 10.0, commands: Vec::new() }
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.commands.push(DrawCommand::Resize { width, height });
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn set_fill_style(&mut self, style: &str) {
        self.commands.push(DrawCommand::FillStyle(style.to_owned()));
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.commands.push(DrawCommand::StrokeStyle(style.to_owned()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.commands.push(DrawCommand::LineWidth(width));
    }

    fn set_font(&mut self, font: &str) {
        for token in font.split_whitespace() {
            if let Some(px) = token.strip_suffix("px") {
                if let Ok(size) = px.parse::<f64>() {
                    self.font_px = size;
                }
            }
        }
        self.commands.push(DrawCommand::Font(font.to_owned()));
    }

    #[allow(clippy::cast_precision_loss)]
    fn measure_text(&self, text: &str) -> TextMetrics {
        let chars = text.chars().count() as f64;
        TextMetrics { width: chars * self.font_px * GLYPH_ADVANCE, ascent: self.font_px * GLYPH_ASCENT }
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.commands.push(DrawCommand::FillText { text: text.to_owned(), x, y });
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        self.commands.push(DrawCommand::StrokeText { text: text.to_owned(), x, y });
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.commands.push(DrawCommand::StrokeRect { x, y, width, height });
    }
}
