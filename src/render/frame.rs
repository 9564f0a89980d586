use crate::foundation::core::{Point, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::surface::Surface;

/// Visual style of a slideshow frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameStyle {
    /// Background fill.
    pub background: Rgba8,
    /// Text color.
    pub foreground: Rgba8,
    /// Font size in pixels.
    pub font_size_px: f32,
    /// Distance between wrapped line centres.
    pub line_height_px: f32,
    /// Maximum line width as a fraction of the surface width.
    pub wrap_ratio: f32,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            background: Rgba8::WHITE,
            foreground: Rgba8::BLACK,
            font_size_px: 24.0,
            line_height_px: 30.0,
            wrap_ratio: 0.8,
        }
    }
}

impl FrameStyle {
    /// Reject non-finite or non-positive metrics.
    pub fn validate(&self) -> ReelResult<()> {
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(ReelError::validation("font_size_px must be finite and > 0"));
        }
        if !self.line_height_px.is_finite() || self.line_height_px <= 0.0 {
            return Err(ReelError::validation(
                "line_height_px must be finite and > 0",
            ));
        }
        if !self.wrap_ratio.is_finite() || self.wrap_ratio <= 0.0 || self.wrap_ratio > 1.0 {
            return Err(ReelError::validation("wrap_ratio must be in (0, 1]"));
        }
        Ok(())
    }
}

/// Greedy word wrap: a word moves to a new line when the line including it (and a trailing space)
/// would exceed `max_width`. A single over-long word keeps its own line.
pub fn wrap_words(
    text: &str,
    max_width: f32,
    mut measure: impl FnMut(&str) -> ReelResult<f32>,
) -> ReelResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for (n, word) in text.split_whitespace().enumerate() {
        let candidate = format!("{line}{word} ");
        if n > 0 && measure(&candidate)? > max_width {
            lines.push(line.trim_end().to_string());
            line = format!("{word} ");
        } else {
            line = candidate;
        }
    }
    lines.push(line.trim_end().to_string());
    Ok(lines)
}

/// Draw one slideshow frame: background plus `text` wrapped and centred at `opacity`.
pub fn draw_frame(
    surface: &mut dyn Surface,
    text: &str,
    opacity: f32,
    style: &FrameStyle,
) -> ReelResult<()> {
    let size = surface.size();
    surface.clear();
    surface.fill(style.background);

    let max_width = size.width as f32 * style.wrap_ratio;
    let lines = wrap_words(text, max_width, |s| {
        surface.measure_text(s, style.font_size_px)
    })?;

    let center = size.center();
    let line_height = f64::from(style.line_height_px);
    let top = center.y - (lines.len().saturating_sub(1) as f64) * line_height / 2.0;
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let at = Point::new(center.x, top + i as f64 * line_height);
        surface.draw_text(line, at, style.font_size_px, style.foreground, opacity)?;
    }
    Ok(())
}
