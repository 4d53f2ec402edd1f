//! Text measurement, drawing and font size fitting.

use ab_glyph::{point, Font, FontVec, GlyphId, PxScale, ScaleFont};
use log::debug;
use std::path::Path;

use crate::bitmap::{Bitmap, BLACK};
use crate::error::Error;

/// Font size used for the single reference measurement in [`fit_font_size`].
pub const TRIAL_FONT_SIZE: f32 = 100.0;

/// Size of a piece of text at a given font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtents {
    /// Horizontal advance of the whole string.
    pub width: f32,
    /// Ink height of the string.
    pub height: f32,
}

/// Measures and draws text.
///
/// Both metrics must scale linearly with the font size.
pub trait TextEngine {
    fn measure(&self, text: &str, size: f32) -> TextExtents;

    /// Draw `text` with its baseline starting at `origin`.
    fn draw(&self, text: &str, size: f32, origin: (f32, f32), bitmap: &mut Bitmap);
}

/// Largest font size at which `text` fits in `max_width` × `max_height`.
///
/// `None` leaves a dimension unconstrained. Only one measurement at
/// [`TRIAL_FONT_SIZE`] is taken; the result is scaled from it.
pub fn fit_font_size<E: TextEngine + ?Sized>(
    engine: &E,
    text: &str,
    max_width: Option<f32>,
    max_height: Option<f32>,
) -> Result<f32, Error> {
    let trial = engine.measure(text, TRIAL_FONT_SIZE);

    let scale = |max: Option<f32>, measured: f32| match max {
        Some(max) => max / measured,
        None => f32::INFINITY,
    };
    let width_scale = scale(max_width, trial.width);
    let height_scale = scale(max_height, trial.height);

    let size = TRIAL_FONT_SIZE * width_scale.min(height_scale);
    if !size.is_finite() {
        return Err(Error::UnmeasurableText(text.to_string()));
    }

    debug!(
        "Fitted {:?} into {:?}x{:?}: size {}",
        text, max_width, max_height, size
    );
    Ok(size)
}

/// [`TextEngine`] backed by a TrueType/OpenType font.
pub struct GlyphTextEngine {
    font: FontVec,
}

impl GlyphTextEngine {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_vec(data)
            .map_err(|_| Error::InvalidFont(path.as_ref().display().to_string()))
    }

    pub fn from_vec(data: Vec<u8>) -> Result<Self, Error> {
        let font = FontVec::try_from_vec(data).map_err(|e| Error::InvalidFont(e.to_string()))?;
        Ok(GlyphTextEngine { font })
    }

    /// Glyph ids and pen positions along the baseline, and the total advance.
    fn layout(&self, text: &str, size: f32) -> (Vec<(GlyphId, f32)>, f32) {
        let scaled = self.font.as_scaled(PxScale::from(size));
        let mut glyphs = Vec::new();
        let mut caret = 0.0f32;
        let mut previous: Option<GlyphId> = None;

        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            glyphs.push((id, caret));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }

        (glyphs, caret)
    }
}

impl TextEngine for GlyphTextEngine {
    fn measure(&self, text: &str, size: f32) -> TextExtents {
        let (glyphs, width) = self.layout(text, size);
        let scaled = self.font.as_scaled(PxScale::from(size));

        // union of unscaled outline bounds, y up
        let mut top = f32::NEG_INFINITY;
        let mut bottom = f32::INFINITY;
        for (id, _) in glyphs.iter() {
            if let Some(outline) = self.font.outline(*id) {
                top = top.max(outline.bounds.max.y.max(outline.bounds.min.y));
                bottom = bottom.min(outline.bounds.min.y.min(outline.bounds.max.y));
            }
        }
        let height = if top > bottom {
            (top - bottom) * scaled.v_scale_factor()
        } else {
            0.0
        };

        TextExtents { width, height }
    }

    fn draw(&self, text: &str, size: f32, origin: (f32, f32), bitmap: &mut Bitmap) {
        let (glyphs, _) = self.layout(text, size);
        let (x0, baseline) = origin;

        for (id, x) in glyphs {
            let glyph = id.with_scale_and_position(PxScale::from(size), point(x0 + x, baseline));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    // no antialiasing
                    if coverage >= 0.5 {
                        bitmap.put(
                            bounds.min.x as i64 + gx as i64,
                            bounds.min.y as i64 + gy as i64,
                            BLACK,
                        );
                    }
                });
            }
        }
    }
}
