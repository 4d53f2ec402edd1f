//! Icon vocabulary and vector icon rendering.

use log::debug;
use resvg::{tiny_skia, usvg};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::bitmap::Bitmap;
use crate::error::Error;
use image::Rgb;

/// Screw head icons that can be put on a label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Icon {
    Hex,
    Flat,
    Phillips,
}

impl Icon {
    pub fn all() -> &'static [Icon] {
        &[Icon::Hex, Icon::Flat, Icon::Phillips]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Flat => "flat",
            Self::Phillips => "phillips",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Hex => "head_hex.svg",
            Self::Flat => "head_flat.svg",
            Self::Phillips => "head_phillips.svg",
        }
    }

    /// Location of the icon file inside `dir`.
    pub fn path_in<P: AsRef<Path>>(&self, dir: P) -> PathBuf {
        dir.as_ref().join(self.file_name())
    }
}

impl FromStr for Icon {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Icon::all()
            .iter()
            .copied()
            .find(|icon| icon.name() == lower)
            .ok_or_else(|| {
                let names: Vec<&str> = Icon::all().iter().map(Icon::name).collect();
                Error::InvalidConfig(format!(
                    "unknown icon {:?}, must be one of: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// Placement rectangle in label pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Renders vector icons into the label bitmap.
pub trait IconRenderer {
    /// Intrinsic width / height of the icon.
    fn aspect_ratio(&self, path: &Path) -> Result<f32, Error>;

    fn render(&self, path: &Path, rect: Rect, bitmap: &mut Bitmap) -> Result<(), Error>;
}

/// [`IconRenderer`] for SVG files, drawn with crisp edges.
pub struct SvgIconRenderer {
    options: usvg::Options<'static>,
}

impl SvgIconRenderer {
    pub fn new() -> Self {
        SvgIconRenderer {
            options: usvg::Options {
                shape_rendering: usvg::ShapeRendering::CrispEdges,
                ..usvg::Options::default()
            },
        }
    }

    fn load(&self, path: &Path) -> Result<usvg::Tree, Error> {
        let data = std::fs::read(path).map_err(|e| render_error(path, e))?;
        usvg::Tree::from_data(&data, &self.options).map_err(|e| render_error(path, e))
    }
}

impl Default for SvgIconRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn render_error<E: std::fmt::Display>(path: &Path, err: E) -> Error {
    Error::IconRender {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

impl IconRenderer for SvgIconRenderer {
    fn aspect_ratio(&self, path: &Path) -> Result<f32, Error> {
        let size = self.load(path)?.size();
        Ok(size.width() / size.height())
    }

    fn render(&self, path: &Path, rect: Rect, bitmap: &mut Bitmap) -> Result<(), Error> {
        let tree = self.load(path)?;
        let width = rect.width.round() as u32;
        let height = rect.height.round() as u32;

        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| render_error(path, format!("empty viewport {}x{}", width, height)))?;
        // fit inside the rect keeping the aspect ratio, centered
        let size = tree.size();
        let scale = (width as f32 / size.width()).min(height as f32 / size.height());
        let transform = tiny_skia::Transform::from_scale(scale, scale).post_translate(
            (width as f32 - size.width() * scale) / 2.0,
            (height as f32 - size.height() * scale) / 2.0,
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let left = rect.x.round() as i64;
        let top = rect.y.round() as i64;
        for (i, px) in pixmap.pixels().iter().enumerate() {
            let alpha = px.alpha() as u32;
            if alpha == 0 {
                continue;
            }
            let x = left + (i as u32 % width) as i64;
            let y = top + (i as u32 / width) as i64;
            if x < 0 || y < 0 || x >= bitmap.width() as i64 || y >= bitmap.height() as i64 {
                continue;
            }

            // premultiplied source over the existing pixel
            let Rgb(dst) = bitmap.pixel(x as u32, y as u32);
            let blend = |src: u8, dst: u8| (src as u32 + dst as u32 * (255 - alpha) / 255) as u8;
            let color = Rgb([
                blend(px.red(), dst[0]),
                blend(px.green(), dst[1]),
                blend(px.blue(), dst[2]),
            ]);
            bitmap.put(x, y, color);
        }

        debug!("Rendered {} into {:?}", path.display(), rect);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{BLACK, WHITE};
    use std::fs;

    fn write_svg(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("pt-label-{}-{}", std::process::id(), name));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn parses_icon_names_case_insensitive() {
        assert_eq!("hex".parse::<Icon>().unwrap(), Icon::Hex);
        assert_eq!("Phillips".parse::<Icon>().unwrap(), Icon::Phillips);
        assert_eq!("FLAT".parse::<Icon>().unwrap(), Icon::Flat);
    }

    #[test]
    fn unknown_icon_is_invalid_config() {
        match "torx".parse::<Icon>() {
            Err(Error::InvalidConfig(msg)) => assert!(msg.contains("hex, flat, phillips")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn icon_paths() {
        assert_eq!(
            Icon::Hex.path_in("images"),
            PathBuf::from("images/head_hex.svg")
        );
    }

    #[test]
    fn aspect_ratio_from_intrinsic_size() {
        let path = write_svg(
            "wide.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"></svg>"#,
        );
        let ratio = SvgIconRenderer::new().aspect_ratio(&path).unwrap();
        assert!((ratio - 2.0).abs() < 1e-6);
        fs::remove_file(path).ok();
    }

    #[test]
    fn renders_into_rect() {
        let path = write_svg(
            "square.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="black"/></svg>"#,
        );
        let mut bitmap = Bitmap::new(20, 10);
        let rect = Rect {
            x: 2.0,
            y: 1.0,
            width: 5.0,
            height: 5.0,
        };

        SvgIconRenderer::new()
            .render(&path, rect, &mut bitmap)
            .unwrap();

        assert_eq!(bitmap.pixel(2, 1), BLACK);
        assert_eq!(bitmap.pixel(6, 5), BLACK);
        assert_eq!(bitmap.pixel(1, 1), WHITE);
        assert_eq!(bitmap.pixel(7, 1), WHITE);
        assert_eq!(bitmap.pixel(2, 6), WHITE);
        fs::remove_file(path).ok();
    }

    #[test]
    fn keeps_aspect_ratio_in_wider_rect() {
        let path = write_svg(
            "square-wide.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="black"/></svg>"#,
        );
        let mut bitmap = Bitmap::new(12, 6);
        let rect = Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 4.0,
        };

        SvgIconRenderer::new()
            .render(&path, rect, &mut bitmap)
            .unwrap();

        let ink: Vec<(u32, u32)> = (0..6)
            .flat_map(|y| (0..12).map(move |x| (x, y)))
            .filter(|&(x, y)| bitmap.pixel(x, y) == BLACK)
            .collect();
        let min_x = ink.iter().map(|p| p.0).min().unwrap();
        let max_x = ink.iter().map(|p| p.0).max().unwrap();
        let min_y = ink.iter().map(|p| p.1).min().unwrap();
        let max_y = ink.iter().map(|p| p.1).max().unwrap();

        // 4x4 square centered in the 10 px wide rect
        assert_eq!((min_x, max_x), (3, 6));
        assert_eq!((min_y, max_y), (0, 3));
        fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file_is_render_error() {
        let result = SvgIconRenderer::new().aspect_ratio(Path::new("/nonexistent/icon.svg"));
        assert!(matches!(result, Err(Error::IconRender { .. })));
    }

    #[test]
    fn malformed_svg_is_render_error() {
        let path = write_svg("broken.svg", "<svg");
        let mut bitmap = Bitmap::new(4, 4);
        let rect = Rect {
            x: 0.0,
            y: 0.0,
            width: 4.0,
            height: 4.0,
        };
        let result = SvgIconRenderer::new().render(&path, rect, &mut bitmap);
        assert!(matches!(result, Err(Error::IconRender { .. })));
        fs::remove_file(path).ok();
    }
}
