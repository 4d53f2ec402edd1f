//! Owned RGB backing store for a label.
//!
//! The bitmap is created white, drawn into in place and replaced wholesale
//! when its width changes.

use image::{imageops, Rgb, RgbImage};
use std::path::Path;

use crate::error::Error;

pub const WHITE: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);
pub const BLACK: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);

/// Length of a dash and of the gap after it, in pixels.
const DASH: u32 = 2;

pub struct Bitmap {
    image: RgbImage,
}

impl Bitmap {
    /// Create a white bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        Bitmap {
            image: RgbImage::from_pixel(width, height, WHITE),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel at `(x, y)` packed as `0xRRGGBB`.
    pub fn rgb(&self, x: u32, y: u32) -> u32 {
        let Rgb([r, g, b]) = *self.image.get_pixel(x, y);
        (r as u32) << 16 | (g as u32) << 8 | b as u32
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.image.get_pixel(x, y)
    }

    /// Set a pixel, silently ignoring coordinates outside the bitmap.
    pub fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u64) < self.width() as u64 && (y as u64) < self.height() as u64
        {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Replace the backing store with one `width` pixels wide.
    ///
    /// Existing content is copied at `(0, 0)`; columns beyond the old width
    /// are white. The old buffer is dropped once the copy is done.
    pub fn resize_width(&mut self, width: u32) {
        let height = self.height();
        let mut resized = RgbImage::from_pixel(width, height, WHITE);
        imageops::replace(&mut resized, &self.image, 0, 0);
        self.image = resized;
    }

    /// Dashed vertical line over the full height at column `x`.
    pub fn dashed_vline(&mut self, x: u32) {
        for y in 0..self.height() {
            if (y / DASH) % 2 == 0 {
                self.put(x as i64, y as i64, BLACK);
            }
        }
    }

    /// Dashed horizontal line over the full width at row `y`.
    pub fn dashed_hline(&mut self, y: u32) {
        for x in 0..self.width() {
            if (x / DASH) % 2 == 0 {
                self.put(x as i64, y as i64, BLACK);
            }
        }
    }

    /// Fill a rectangle, clipped to the bitmap.
    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb<u8>) {
        for dy in 0..height as i64 {
            for dx in 0..width as i64 {
                self.put(x + dx, y + dy, color);
            }
        }
    }

    /// Encode the bitmap as PNG.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(Error::from)
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.image
    }
}
