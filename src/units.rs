/// Millimeters per inch.
pub const MM_PER_INCH: f32 = 25.4;

/// Convert a physical length in millimeters to printer dots at `dpi`.
///
/// The result is rounded to the nearest dot.
pub fn pixels_from_mm(dpi: u32, mm: f32) -> u32 {
    (dpi as f32 * mm / MM_PER_INCH).round() as u32
}
