//! Places icons and text on a label.
//!
//! The composer owns the label bitmap and geometry. Drawing itself is left to
//! a [`TextEngine`] and an [`IconRenderer`]; every placement decision is made
//! here.

use log::{debug, info};
use std::path::Path;

use crate::bitmap::Bitmap;
use crate::config::{LabelConfig, PrintRequest};
use crate::error::Error;
use crate::geometry::{LabelGeometry, Split};
use crate::icon::{IconRenderer, Rect};
use crate::text::{fit_font_size, TextEngine};

/// Result of [`LabelComposer::place_text`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedText {
    /// Floored font size the text was drawn at.
    pub font_size: f32,
    /// Measured width, clamped to the available box.
    pub width: f32,
    /// Measured height, clamped to the available box.
    pub height: f32,
    /// Left end of the baseline.
    pub origin: (f32, f32),
}

pub struct LabelComposer<'a> {
    geometry: LabelGeometry,
    bitmap: Bitmap,
    text: &'a dyn TextEngine,
    icons: &'a dyn IconRenderer,
}

impl<'a> LabelComposer<'a> {
    /// Start a white label sized after `geometry`.
    pub fn new(
        geometry: LabelGeometry,
        text: &'a dyn TextEngine,
        icons: &'a dyn IconRenderer,
    ) -> Self {
        let bitmap = Bitmap::new(geometry.width_px(), geometry.height_px());
        LabelComposer {
            geometry,
            bitmap,
            text,
            icons,
        }
    }

    /// Draw an icon at the cursor, scaled to the canvas height.
    ///
    /// Returns the width consumed, margins included.
    pub fn place_icon(&mut self, path: &Path) -> Result<u32, Error> {
        let canvas = *self.geometry.active();
        let margin_x = self.geometry.element_margin_x();
        let margin_y = self.geometry.element_margin_y();

        let aspect = self.icons.aspect_ratio(path)?;
        let render_width = canvas.size_y as f32 * aspect;
        let rect = Rect {
            x: (canvas.origin_x + canvas.cursor_x + margin_x) as f32,
            y: (self.geometry.label_margin() + margin_y) as f32,
            width: render_width,
            height: canvas.size_y.saturating_sub(2 * margin_y) as f32,
        };

        self.icons.render(path, rect, &mut self.bitmap)?;

        let consumed = render_width.ceil() as u32 + 2 * margin_x;
        self.geometry.advance(consumed);
        debug!("Placed icon {} ({} px)", path.display(), consumed);
        Ok(consumed)
    }

    /// Draw `text` at the cursor with the largest font that fits the rest of
    /// the canvas, centered vertically.
    pub fn place_text(&mut self, text: &str) -> Result<PlacedText, Error> {
        let canvas = *self.geometry.active();
        let margin_x = self.geometry.element_margin_x() as f32;
        let margin_y = self.geometry.element_margin_y() as f32;

        let max_width = canvas.size_x as f32 - canvas.cursor_x as f32 - 2.0 * margin_x;
        let max_height = canvas.size_y as f32 - 2.0 * margin_y;

        let font_size = fit_font_size(self.text, text, Some(max_width), Some(max_height))?.floor();
        if font_size < 1.0 {
            return Err(Error::InsufficientSpace(text.to_string()));
        }

        // rendering can overshoot the fitted box by a pixel or two
        let measured = self.text.measure(text, font_size);
        let width = measured.width.min(max_width);
        let height = measured.height.min(max_height);

        let origin = (
            (canvas.origin_x + canvas.cursor_x) as f32 + margin_x,
            self.geometry.label_margin() as f32 + (canvas.size_y as f32 - height) / 2.0 + height,
        );
        self.text.draw(text, font_size, origin, &mut self.bitmap);

        self.geometry
            .advance(width.ceil() as u32 + 2 * self.geometry.element_margin_x());

        info!("Placed {:?} at font size {}", text, font_size);
        Ok(PlacedText {
            font_size,
            width,
            height,
            origin,
        })
    }

    /// Split the label into two canvases and draw the divider between them.
    pub fn split(&mut self) -> Result<Split, Error> {
        let split = self.geometry.split()?;
        self.bitmap.dashed_vline(split.divider_x);
        Ok(split)
    }

    pub fn select_canvas(&mut self, origin_x: u32) -> Result<(), Error> {
        self.geometry.select_canvas(origin_x)
    }

    /// Shrink the label to the width actually used plus `trailing_margin`.
    ///
    /// Does nothing if the label is already that narrow.
    pub fn crop(&mut self, trailing_margin: u32) {
        let width = self.geometry.content_extent() + self.geometry.label_margin() + trailing_margin;
        if width >= self.geometry.width_px() {
            return;
        }

        self.bitmap.resize_width(width);
        self.geometry.cropped_to(width);
        debug!("Cropped label to {} px", width);
    }

    /// Dashed cut markers at the right edge and below the printable area.
    pub fn add_cut_guides(&mut self) {
        let right = self.bitmap.width().saturating_sub(1);
        let bottom = (self.geometry.label_margin() + self.geometry.active().size_y)
            .min(self.bitmap.height().saturating_sub(1));

        self.bitmap.dashed_vline(right);
        self.bitmap.dashed_hline(bottom);
    }

    /// Lay out a whole request: one canvas per section, icon first.
    pub fn compose(&mut self, request: &PrintRequest, icon_dir: &Path) -> Result<(), Error> {
        let mut origins = vec![self.geometry.active().origin_x];
        if request.is_split() {
            origins.push(self.split()?.second_origin_x);
        }

        let icon_paths = request.icon_paths(icon_dir);
        for ((section, icon), origin) in request.sections().iter().zip(icon_paths).zip(origins) {
            self.select_canvas(origin)?;
            if let Some(path) = icon {
                self.place_icon(&path)?;
            }
            self.place_text(&section.text)?;
        }
        Ok(())
    }

    /// Crop and add the cut guides as configured.
    pub fn finish(&mut self, config: &LabelConfig) {
        self.crop(config.trailing());
        if config.with_cut_guides() {
            self.add_cut_guides();
        }
    }

    pub fn geometry(&self) -> &LabelGeometry {
        &self.geometry
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }
}
