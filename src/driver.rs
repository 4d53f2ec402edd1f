use crate::error::Error;

/// Phase and status type of a printer status reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusReport {
    pub phase_type: u8,
    pub status_type: u8,
}

impl StatusReport {
    /// Status type sent when the printer changes phase.
    pub const PHASE_CHANGE: u8 = 0x06;
    /// Phase type of a printer that is ready to receive data.
    pub const RECEIVING: u8 = 0x00;

    /// The mechanism went back to receiving after a print.
    pub fn is_print_finished(&self) -> bool {
        self.phase_type == Self::RECEIVING && self.status_type == Self::PHASE_CHANGE
    }
}

/// What the rasterizer needs from a connected label printer.
pub trait PrinterDriver {
    fn dpi(&self) -> u32;

    /// Number of pins on the print head.
    fn max_print_width(&self) -> u32;

    /// Printable width of the installed tape, in pixels.
    fn tape_width(&self) -> u32;

    /// Announce a job of `columns` raster lines.
    fn start_raster(&mut self, columns: u32) -> Result<(), Error>;

    fn send_raster_line(&mut self, line: &[u8]) -> Result<(), Error>;

    /// Print what was sent and feed the label out.
    fn eject(&mut self) -> Result<(), Error>;

    /// Next status reply, or `None` if the printer had nothing to report.
    fn read_status(&mut self) -> Result<Option<StatusReport>, Error>;
}
