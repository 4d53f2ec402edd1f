//! Label dimensions, margins and canvas cursors.
//!
//! A label starts with a single canvas covering the area inside the outer
//! margin. [`LabelGeometry::split`] turns it into two equally sized canvases,
//! each with its own cursor.

use log::{debug, warn};

use crate::error::Error;
use crate::units::pixels_from_mm;

/// What to do when the printable height cap is taller than the label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightCapPolicy {
    /// Refuse the cap with [`Error::InvalidGeometry`].
    Reject,
    /// Log a warning and keep the oversized canvas height.
    Warn,
}

impl Default for HeightCapPolicy {
    fn default() -> Self {
        Self::Reject
    }
}

/// One printable sub-area of the label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    /// Offset from the label's left edge.
    pub origin_x: u32,
    pub size_x: u32,
    pub size_y: u32,
    /// Width already consumed by placed elements. May exceed `size_x`.
    pub cursor_x: u32,
    touched: bool,
}

impl Canvas {
    fn new(origin_x: u32, size_x: u32, size_y: u32) -> Self {
        Canvas {
            origin_x,
            size_x,
            size_y,
            cursor_x: 0,
            touched: false,
        }
    }

    /// Whether an element has ever been placed in this canvas.
    pub fn touched(&self) -> bool {
        self.touched
    }

    /// Right edge of the placed content.
    pub fn extent(&self) -> u32 {
        self.origin_x + self.cursor_x
    }
}

/// Returned by [`LabelGeometry::split`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    /// Column of the divider between the two canvases.
    pub divider_x: u32,
    /// `origin_x` of the second canvas, for [`LabelGeometry::select_canvas`].
    pub second_origin_x: u32,
}

#[derive(Debug, Clone)]
pub struct LabelGeometry {
    width_px: u32,
    height_px: u32,
    label_margin: u32,
    element_margin_x: u32,
    element_margin_y: u32,
    height_cap_policy: HeightCapPolicy,
    canvases: Vec<Canvas>,
    active: usize,
}

fn shrink(size: u32, margin: u32) -> u32 {
    size.saturating_sub(2 * margin)
}

impl LabelGeometry {
    pub fn new(label_margin: u32, element_margin_x: u32, element_margin_y: u32) -> Self {
        LabelGeometry {
            width_px: 0,
            height_px: 0,
            label_margin,
            element_margin_x,
            element_margin_y,
            height_cap_policy: HeightCapPolicy::default(),
            canvases: vec![Canvas::new(label_margin, 0, 0)],
            active: 0,
        }
    }

    pub fn height_cap_policy(self, policy: HeightCapPolicy) -> Self {
        LabelGeometry {
            height_cap_policy: policy,
            ..self
        }
    }

    /// Set the label width from a physical length and reset to a single,
    /// empty canvas.
    pub fn set_width(&mut self, dpi: u32, mm: f32) {
        self.set_width_px(pixels_from_mm(dpi, mm));
    }

    pub fn set_width_px(&mut self, width: u32) {
        self.width_px = width;
        let size_y = self
            .canvases
            .get(self.active)
            .map(|c| c.size_y)
            .unwrap_or_else(|| shrink(self.height_px, self.label_margin));
        self.canvases = vec![Canvas::new(
            self.label_margin,
            shrink(width, self.label_margin),
            size_y,
        )];
        self.active = 0;
        debug!("Label width set to {} px", width);
    }

    pub fn set_height(&mut self, height: u32) {
        self.height_px = height;
        let size_y = shrink(height, self.label_margin);
        for canvas in self.canvases.iter_mut() {
            canvas.size_y = size_y;
        }
        debug!("Label height set to {} px", height);
    }

    /// Limit the canvas height to a physical printable height.
    pub fn set_printable_height_cap(&mut self, dpi: u32, mm: f32) -> Result<(), Error> {
        let size_y = shrink(pixels_from_mm(dpi, mm), self.label_margin);
        let available = shrink(self.height_px, self.label_margin);

        if size_y > available {
            let msg = format!(
                "printable height {} px exceeds label height {} px",
                size_y, available
            );
            match self.height_cap_policy {
                HeightCapPolicy::Reject => return Err(Error::InvalidGeometry(msg)),
                HeightCapPolicy::Warn => warn!("{}, keeping it anyway", msg),
            }
        }

        for canvas in self.canvases.iter_mut() {
            canvas.size_y = size_y;
        }
        Ok(())
    }

    /// Divide the label into two canvases of equal width.
    ///
    /// The first canvas stays active and keeps its cursor.
    pub fn split(&mut self) -> Result<Split, Error> {
        if self.canvases.len() > 1 {
            return Err(Error::AlreadySplit);
        }

        let half = self.width_px / 2;
        let size_x = shrink(half, self.label_margin);
        let first = self.canvases[0];
        let second_origin_x = half + self.label_margin;

        self.canvases = vec![
            Canvas { size_x, ..first },
            Canvas::new(second_origin_x, size_x, first.size_y),
        ];
        self.active = 0;

        debug!(
            "Split label at x = {}, canvases {} px wide",
            half, size_x
        );

        Ok(Split {
            divider_x: half,
            second_origin_x,
        })
    }

    /// Make the canvas starting at `origin_x` active and rewind its cursor.
    pub fn select_canvas(&mut self, origin_x: u32) -> Result<(), Error> {
        let index = self
            .canvases
            .iter()
            .position(|c| c.origin_x == origin_x)
            .ok_or(Error::UnknownCanvas(origin_x))?;

        self.active = index;
        self.canvases[index].cursor_x = 0;
        Ok(())
    }

    /// Consume `width` pixels of the active canvas.
    pub fn advance(&mut self, width: u32) {
        let canvas = &mut self.canvases[self.active];
        canvas.cursor_x += width;
        canvas.touched = true;
    }

    /// Right-most column reached by placed content over all canvases.
    pub fn content_extent(&self) -> u32 {
        self.canvases
            .iter()
            .filter(|c| c.touched)
            .map(Canvas::extent)
            .max()
            .unwrap_or_else(|| self.active().origin_x)
    }

    /// Record a new label width after a crop without touching the canvases.
    pub(crate) fn cropped_to(&mut self, width: u32) {
        self.width_px = width;
    }

    pub fn active(&self) -> &Canvas {
        &self.canvases[self.active]
    }

    pub fn canvases(&self) -> &[Canvas] {
        &self.canvases
    }

    pub fn width_px(&self) -> u32 {
        self.width_px
    }

    pub fn height_px(&self) -> u32 {
        self.height_px
    }

    pub fn label_margin(&self) -> u32 {
        self.label_margin
    }

    pub fn element_margin_x(&self) -> u32 {
        self.element_margin_x
    }

    pub fn element_margin_y(&self) -> u32 {
        self.element_margin_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(margin: u32) -> LabelGeometry {
        let mut geometry = LabelGeometry::new(margin, 0, 0);
        geometry.set_height(76);
        geometry.set_width(180, 36.0);
        geometry
    }

    #[test]
    fn width_resets_single_canvas() {
        let geometry = geometry(1);
        assert_eq!(geometry.width_px(), 255);
        assert_eq!(geometry.canvases().len(), 1);
        let canvas = geometry.active();
        assert_eq!(canvas.origin_x, 1);
        assert_eq!(canvas.size_x, 253);
        assert_eq!(canvas.size_y, 74);
        assert_eq!(canvas.cursor_x, 0);
    }

    #[test]
    fn set_width_discards_split() {
        let mut geometry = geometry(1);
        geometry.split().unwrap();
        geometry.set_width(180, 20.0);
        assert_eq!(geometry.canvases().len(), 1);
        assert_eq!(geometry.active().size_y, 74);
    }

    #[test]
    fn printable_height_cap_within_label() {
        let mut geometry = geometry(1);
        geometry.set_printable_height_cap(180, 8.0).unwrap();
        assert_eq!(geometry.active().size_y, 55);
    }

    #[test]
    fn oversized_cap_is_rejected_by_default() {
        let mut geometry = LabelGeometry::new(1, 0, 0);
        geometry.set_height(24);
        geometry.set_width(180, 36.0);

        let result = geometry.set_printable_height_cap(180, 8.0);

        assert!(matches!(result, Err(Error::InvalidGeometry(_))));
        assert_eq!(geometry.active().size_y, 22);
    }

    #[test]
    fn oversized_cap_is_kept_when_lenient() {
        let mut geometry = LabelGeometry::new(1, 0, 0).height_cap_policy(HeightCapPolicy::Warn);
        geometry.set_height(24);
        geometry.set_width(180, 36.0);

        geometry.set_printable_height_cap(180, 8.0).unwrap();

        // taller than the label itself
        assert_eq!(geometry.active().size_y, 55);
        assert!(geometry.active().size_y > geometry.height_px());
    }

    #[test]
    fn split_is_symmetric() {
        for width in [100u32, 101, 255, 256] {
            let mut geometry = LabelGeometry::new(3, 0, 0);
            geometry.set_height(76);
            geometry.set_width_px(width);

            let split = geometry.split().unwrap();
            let canvases = geometry.canvases();

            assert_eq!(canvases.len(), 2);
            assert_eq!(canvases[0].size_x, canvases[1].size_x);
            assert_eq!(canvases[0].size_x, width / 2 - 6);
            assert_eq!(split.divider_x, width / 2);
            assert_eq!(split.second_origin_x, canvases[1].origin_x);
            for canvas in canvases {
                assert!(canvas.origin_x + canvas.size_x <= width);
            }
        }
    }

    #[test]
    fn second_split_is_refused() {
        let mut geometry = geometry(1);
        geometry.split().unwrap();
        assert!(matches!(geometry.split(), Err(Error::AlreadySplit)));
    }

    #[test]
    fn select_canvas_rewinds_cursor() {
        let mut geometry = geometry(1);
        let split = geometry.split().unwrap();

        geometry.select_canvas(split.second_origin_x).unwrap();
        geometry.advance(30);
        assert_eq!(geometry.active().cursor_x, 30);

        geometry.select_canvas(split.second_origin_x).unwrap();
        assert_eq!(geometry.active().cursor_x, 0);
        assert_eq!(geometry.active().origin_x, split.second_origin_x);
    }

    #[test]
    fn select_unknown_canvas_fails() {
        let mut geometry = geometry(1);
        assert!(matches!(
            geometry.select_canvas(42),
            Err(Error::UnknownCanvas(42))
        ));
    }

    #[test]
    fn cursor_is_additive() {
        let mut geometry = geometry(1);
        let widths = [12u32, 7, 40, 1];
        for w in widths.iter() {
            geometry.advance(*w);
        }
        assert_eq!(geometry.active().cursor_x, widths.iter().sum::<u32>());
    }

    #[test]
    fn cursor_may_overflow_canvas() {
        let mut geometry = geometry(1);
        geometry.advance(300);
        assert!(geometry.active().cursor_x > geometry.active().size_x);
    }

    #[test]
    fn extent_covers_rightmost_touched_canvas() {
        let mut geometry = geometry(1);
        let split = geometry.split().unwrap();

        geometry.select_canvas(split.second_origin_x).unwrap();
        geometry.advance(20);
        geometry.select_canvas(1).unwrap();
        geometry.advance(10);

        // canvas 0 was drawn last but canvas 1 reaches further right
        assert_eq!(geometry.content_extent(), split.second_origin_x + 20);
    }

    #[test]
    fn extent_without_content_is_active_origin() {
        let geometry = geometry(2);
        assert_eq!(geometry.content_extent(), 2);
    }
}
