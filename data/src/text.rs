//! Label size estimation used by tooltips and axis gutters.
//!
//! The estimate is a monospace heuristic. Anything that can measure real glyph
//! advances can implement [`TextMetrics`] instead and layout code stays untouched.

/// Average glyph advance as a fraction of the font size.
pub const CHAR_WIDTH_RATIO: f32 = 0.55;
/// Line box height as a multiple of the font size.
pub const LINE_HEIGHT_RATIO: f32 = 1.2;

pub trait TextMetrics {
    fn width(&self, text: &str, font_size: f32) -> f32;

    fn line_height(&self, font_size: f32) -> f32 {
        font_size * LINE_HEIGHT_RATIO
    }
}

/// `font_size × 0.55 × chars`
#[derive(Debug, Clone, Copy, Default)]
pub struct Heuristic;

impl TextMetrics for Heuristic {
    fn width(&self, text: &str, font_size: f32) -> f32 {
        estimate_width(text, font_size)
    }
}

pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    font_size * CHAR_WIDTH_RATIO * text.chars().count() as f32
}

/// Width of the widest label, zero when there are none.
pub fn widest(labels: &[String], font_size: f32, metrics: &impl TextMetrics) -> f32 {
    labels
        .iter()
        .map(|l| metrics.width(l, font_size))
        .fold(0.0, f32::max)
}
