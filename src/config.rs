//! Label layout settings and print requests.

use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::geometry::{HeightCapPolicy, LabelGeometry};
use crate::icon::Icon;

/// Label width used when none is configured.
pub const DEFAULT_WIDTH_MM: f32 = 36.0;

/// Printable height cap used when none is configured.
pub const DEFAULT_PRINTABLE_HEIGHT_MM: f32 = 8.0;

/// Maximum number of canvases, and so of texts, on one label.
pub const MAX_CANVASES: usize = 2;

/// Layout settings for one label.
///
/// # Example
///
/// ```
/// use pt_label::LabelConfig;
///
/// let config = LabelConfig::new().margin(1).element_margins(2, 0);
/// assert_eq!(config.label_margin(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct LabelConfig {
    label_margin: u32,
    element_margin_x: u32,
    element_margin_y: u32,
    width_mm: f32,
    printable_height_mm: Option<f32>,
    trailing_margin: Option<u32>,
    height_cap_policy: HeightCapPolicy,
    cut_guides: bool,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelConfig {
    pub fn new() -> Self {
        LabelConfig {
            label_margin: 1,
            element_margin_x: 0,
            element_margin_y: 0,
            width_mm: DEFAULT_WIDTH_MM,
            printable_height_mm: Some(DEFAULT_PRINTABLE_HEIGHT_MM),
            trailing_margin: None,
            height_cap_policy: HeightCapPolicy::Reject,
            cut_guides: false,
        }
    }

    /// Outer margin applied to all four edges.
    pub fn margin(self, label_margin: u32) -> Self {
        LabelConfig {
            label_margin,
            ..self
        }
    }

    /// Spacing around each placed icon or text.
    pub fn element_margins(self, x: u32, y: u32) -> Self {
        LabelConfig {
            element_margin_x: x,
            element_margin_y: y,
            ..self
        }
    }

    pub fn width_mm(self, width_mm: f32) -> Self {
        LabelConfig { width_mm, ..self }
    }

    /// Cap the usable height to a physical size, or `None` to use the full
    /// label height.
    pub fn printable_height_mm(self, mm: Option<f32>) -> Self {
        LabelConfig {
            printable_height_mm: mm,
            ..self
        }
    }

    /// Blank space kept right of the content when cropping. Defaults to the
    /// label margin.
    pub fn trailing_margin(self, margin: u32) -> Self {
        LabelConfig {
            trailing_margin: Some(margin),
            ..self
        }
    }

    pub fn height_cap_policy(self, policy: HeightCapPolicy) -> Self {
        LabelConfig {
            height_cap_policy: policy,
            ..self
        }
    }

    pub fn cut_guides(self, flag: bool) -> Self {
        LabelConfig {
            cut_guides: flag,
            ..self
        }
    }

    pub fn label_margin(&self) -> u32 {
        self.label_margin
    }

    pub fn trailing(&self) -> u32 {
        self.trailing_margin.unwrap_or(self.label_margin)
    }

    pub fn with_cut_guides(&self) -> bool {
        self.cut_guides
    }

    /// Build the label geometry for a tape `height` pixels tall printed at `dpi`.
    pub fn geometry(&self, dpi: u32, height: u32) -> Result<LabelGeometry, Error> {
        if self.width_mm.is_nan() || self.width_mm <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "label width must be positive, got {} mm",
                self.width_mm
            )));
        }

        let mut geometry = LabelGeometry::new(
            self.label_margin,
            self.element_margin_x,
            self.element_margin_y,
        )
        .height_cap_policy(self.height_cap_policy);

        geometry.set_height(height);
        geometry.set_width(dpi, self.width_mm);
        if let Some(mm) = self.printable_height_mm {
            geometry.set_printable_height_cap(dpi, mm)?;
        }

        Ok(geometry)
    }
}

/// One text per canvas, optionally preceded by an icon.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintRequest {
    sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub icon: Option<Icon>,
    pub text: String,
}

impl PrintRequest {
    /// Pair up icons and texts.
    ///
    /// There must be one or two texts, and either no icon at all or exactly
    /// one icon per text.
    pub fn new(icons: Vec<Icon>, texts: Vec<String>) -> Result<Self, Error> {
        if texts.is_empty() || texts.len() > MAX_CANVASES {
            return Err(Error::InvalidConfig(format!(
                "expected 1 to {} texts, got {}",
                MAX_CANVASES,
                texts.len()
            )));
        }
        if !icons.is_empty() && icons.len() != texts.len() {
            return Err(Error::InvalidConfig(format!(
                "got {} icons for {} texts, counts must match",
                icons.len(),
                texts.len()
            )));
        }

        let sections = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Section {
                icon: icons.get(i).copied(),
                text,
            })
            .collect();

        Ok(PrintRequest { sections })
    }

    /// Parse icon names from the command line.
    pub fn parse(icons: &[String], texts: Vec<String>) -> Result<Self, Error> {
        let icons = icons
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<Icon>, Error>>()?;
        Self::new(icons, texts)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Whether the label needs two canvases.
    pub fn is_split(&self) -> bool {
        self.sections.len() > 1
    }

    /// Icon files for each section, resolved against `dir`.
    pub fn icon_paths<P: AsRef<Path>>(&self, dir: P) -> Vec<Option<PathBuf>> {
        self.sections
            .iter()
            .map(|s| s.icon.map(|icon| icon.path_in(dir.as_ref())))
            .collect()
    }
}
