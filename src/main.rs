//! # pt-label
//!
//! Print a screw label on a P-Touch PT series printer.
//!
//! ## Usage
//!
//! ```bash
//! # One hex head screw label
//! pt-label --font DejaVuSans.ttf --icon hex --text M3x8
//!
//! # Two labels side by side, cut guides included
//! pt-label --icon hex --text M3 --icon phillips --text M4 --cut-guides
//!
//! # Render to label.png instead of printing
//! pt-label --text M3 --dry label.png
//! ```

use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

use pt_label::{
    Completion, Error, GlyphTextEngine, HeightCapPolicy, LabelComposer, LabelConfig, PollPolicy,
    PrintRequest, Printer, PrinterConfig, PrinterDriver, Rasterizer, SvgIconRenderer,
    DEFAULT_PRINTABLE_HEIGHT_MM, DEFAULT_WIDTH_MM, DRY_RUN_DPI, DRY_RUN_TAPE_WIDTH,
};

#[derive(Parser, Debug)]
#[command(name = "pt-label")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Label text; give it twice for two labels side by side
    #[arg(long, default_value = "TEST")]
    text: Vec<String>,

    /// Icon in front of each text (hex, flat, phillips)
    #[arg(long)]
    icon: Vec<String>,

    /// Directory holding the icon SVG files
    #[arg(long, value_name = "DIR", default_value = "images")]
    icon_dir: PathBuf,

    /// TrueType or OpenType font used for the text
    #[arg(long, value_name = "FILE", env = "PT_LABEL_FONT")]
    font: PathBuf,

    /// Save a PNG preview instead of printing
    #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = "test.png")]
    dry: Option<PathBuf>,

    /// Blank border around the label, in pixels
    #[arg(long, default_value_t = 1)]
    margin: u32,

    /// Horizontal padding around each icon and text, in pixels
    #[arg(long, default_value_t = 0)]
    element_margin_x: u32,

    /// Vertical padding around each icon and text, in pixels
    #[arg(long, default_value_t = 0)]
    element_margin_y: u32,

    /// Label length before cropping, in mm
    #[arg(long, default_value_t = DEFAULT_WIDTH_MM)]
    width_mm: f32,

    /// Upper bound on the printable height, in mm
    #[arg(long, default_value_t = DEFAULT_PRINTABLE_HEIGHT_MM)]
    printable_height_mm: f32,

    /// Blank space after the content, in pixels [default: margin]
    #[arg(long)]
    trailing_margin: Option<u32>,

    /// Draw dashed lines where to cut the label
    #[arg(long)]
    cut_guides: bool,

    /// Only warn when the tape is taller than the printable height
    #[arg(long)]
    lenient_height: bool,

    /// Serial number of the printer to use
    #[arg(long)]
    serial: Option<String>,

    /// Seconds to wait for the printer to finish
    #[arg(long, default_value_t = 60)]
    poll_timeout_secs: u64,
}

impl Cli {
    fn label_config(&self) -> LabelConfig {
        let policy = if self.lenient_height {
            HeightCapPolicy::Warn
        } else {
            HeightCapPolicy::Reject
        };
        let config = LabelConfig::new()
            .margin(self.margin)
            .element_margins(self.element_margin_x, self.element_margin_y)
            .width_mm(self.width_mm)
            .printable_height_mm(Some(self.printable_height_mm))
            .height_cap_policy(policy)
            .cut_guides(self.cut_guides);

        match self.trailing_margin {
            Some(trailing) => config.trailing_margin(trailing),
            None => config,
        }
    }

    fn printer_config(&self) -> PrinterConfig {
        match &self.serial {
            Some(serial) => PrinterConfig::new().serial(serial.clone()),
            None => PrinterConfig::new(),
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{}:{}] {} - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.level(),
                record.args()
            )
        })
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let request = PrintRequest::parse(&cli.icon, cli.text.clone())?;
    let config = cli.label_config();

    let mut printer = match Printer::open(cli.printer_config()) {
        Ok(printer) => Some(printer),
        Err(err) if cli.dry.is_some() => {
            warn!("No printer available ({}), assuming {} px tape", err, DRY_RUN_TAPE_WIDTH);
            None
        }
        Err(err) => return Err(err),
    };

    let (dpi, tape_width) = match &printer {
        Some(printer) => {
            if let Some(tape) = printer.status().tape {
                info!("{:?} with {} mm tape", printer.model(), tape.mm());
            }
            (printer.dpi(), printer.tape_width())
        }
        None => (DRY_RUN_DPI, DRY_RUN_TAPE_WIDTH),
    };
    info!("Tape is {} px at {} dpi", tape_width, dpi);

    let geometry = config.geometry(dpi, tape_width)?;
    let font = GlyphTextEngine::from_file(&cli.font)?;
    let icons = SvgIconRenderer::new();

    let mut composer = LabelComposer::new(geometry, &font, &icons);
    composer.compose(&request, &cli.icon_dir)?;
    composer.finish(&config);

    if let Some(path) = &cli.dry {
        composer.bitmap().save_png(path)?;
        info!("Saved preview to {}", path.display());
        return Ok(());
    }

    let printer = match printer.as_mut() {
        Some(printer) => printer,
        None => return Err(Error::DeviceOffline),
    };
    let policy = PollPolicy::default().timeout(Duration::from_secs(cli.poll_timeout_secs));
    let report = Rasterizer::new(printer)
        .policy(policy)
        .print(composer.bitmap())?;

    if report.failed_lines > 0 {
        warn!("{} of {} raster lines failed", report.failed_lines, report.columns);
    }
    if report.completion == Completion::TimedOut {
        warn!("Printer did not report completion within {}s", cli.poll_timeout_secs);
    }
    Ok(())
}
