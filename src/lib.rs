//! P-Touch Label Printer
//!
//! This crate lays out short labels (optionally with a screw head icon in
//! front of the text) and prints them on Brother P-Touch PT series tape
//! printers over USB.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pt_label::{
//!     GlyphTextEngine, LabelComposer, LabelConfig, PrintRequest, Printer, PrinterConfig,
//!     PrinterDriver, Rasterizer, SvgIconRenderer,
//! };
//!
//! let mut printer = Printer::open(PrinterConfig::new()).unwrap();
//! let config = LabelConfig::new();
//! let geometry = config.geometry(printer.dpi(), printer.tape_width()).unwrap();
//!
//! let font = GlyphTextEngine::from_file("DejaVuSans.ttf").unwrap();
//! let icons = SvgIconRenderer::new();
//! let request = PrintRequest::parse(&["hex".to_string()], vec!["M3".to_string()]).unwrap();
//!
//! let mut composer = LabelComposer::new(geometry, &font, &icons);
//! composer.compose(&request, Path::new("images")).unwrap();
//! composer.finish(&config);
//!
//! let report = Rasterizer::new(&mut printer).print(composer.bitmap()).unwrap();
//! println!("{:?}", report);
//! ```

mod bitmap;
mod composer;
mod config;
mod driver;
mod error;
mod geometry;
mod icon;
mod media;
mod model;
mod printer;
mod raster;
mod text;
mod units;

pub use crate::{
    bitmap::{Bitmap, BLACK, WHITE},
    composer::{LabelComposer, PlacedText},
    config::{
        LabelConfig, PrintRequest, Section, DEFAULT_PRINTABLE_HEIGHT_MM, DEFAULT_WIDTH_MM,
        MAX_CANVASES,
    },
    driver::{PrinterDriver, StatusReport},
    error::{Error, PrinterError},
    geometry::{Canvas, HeightCapPolicy, LabelGeometry, Split},
    icon::{Icon, IconRenderer, Rect, SvgIconRenderer},
    media::TapeWidth,
    model::{Model, ModelFlags, VENDOR_ID},
    printer::{
        info_command, raster_command, Notification, Phase, Printer, PrinterConfig, Status,
        StatusType,
    },
    raster::{
        center_offset, is_mark, raster_line, Clock, Completion, PollPolicy, PrintReport,
        RasterState, Rasterizer, SystemClock, THRESHOLD_MASK,
    },
    text::{fit_font_size, GlyphTextEngine, TextEngine, TextExtents, TRIAL_FONT_SIZE},
    units::{pixels_from_mm, MM_PER_INCH},
};

/// Tape height assumed when rendering to a file without a printer.
pub const DRY_RUN_TAPE_WIDTH: u32 = 76;

/// Resolution assumed when rendering to a file without a printer.
pub const DRY_RUN_DPI: u32 = 180;
