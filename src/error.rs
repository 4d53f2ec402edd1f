//! Error types for label composition and P-Touch printer operations.
//!
//! This module defines all possible errors that can occur while laying out a
//! label, rendering icons and text, and talking to the printer.

use thiserror::Error;

/// Main error type for label and printer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// libusb failure while talking to the printer.
    #[error(transparent)]
    UsbError(#[from] rusb::Error),

    /// No supported P-Touch printer found on the bus.
    #[error("Device is offline")]
    DeviceOffline,

    #[error("Can't read device list, permission issue ?")]
    DeviceListNotReadable,

    #[error("Device is missing endpoint")]
    MissingEndpoint,

    #[error("Received invalid response from printer")]
    InvalidResponse(usize),

    #[error("Status request return no response")]
    ReadStatusTimeout,

    #[error("No media is installed in the printer")]
    NoMediaInstalled,

    /// Fault reported in the printer's status reply.
    #[error(transparent)]
    PrinterError(PrinterError),

    /// Unknown icon names, icon and text counts that do not match, or too
    /// many texts for the two available canvases.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Label geometry that cannot be honoured, e.g. a printable height cap
    /// taller than the label itself.
    #[error("Invalid label geometry: {0}")]
    InvalidGeometry(String),

    #[error("Label is already split into two canvases")]
    AlreadySplit,

    #[error("No canvas starts at x = {0}")]
    UnknownCanvas(u32),

    #[error("Text {0:?} has no measurable extent")]
    UnmeasurableText(String),

    /// The remaining space in the active canvas cannot hold even a 1px font.
    #[error("Not enough space left in canvas for text {0:?}")]
    InsufficientSpace(String),

    #[error("Invalid font: {0}")]
    InvalidFont(String),

    /// The icon renderer reported a failure. The job is aborted.
    #[error("Could not render icon {path}: {reason}")]
    IconRender { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Error bits of a PT status reply.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PrinterError {
    #[error("No media is installed")]
    NoMedia,

    #[error("End of media")]
    EndOfMedia,

    #[error("Cutter jam")]
    CutterJam,

    #[error("Weak batteries")]
    WeakBatteries,

    #[error("High voltage adapter")]
    HighVoltageAdapter,

    #[error("Installed media is not match")]
    InvalidMedia,

    #[error("Expansion buffer is full")]
    BufferFull,

    #[error("Cover is open")]
    CoverOpen,

    #[error("Overheating")]
    Overheating,

    #[error("Unknown error")]
    UnknownError((u8, u8)),
}

impl PrinterError {
    /// Decode error information 1 and 2 (bytes 8 and 9).
    ///
    /// A clean status decodes to `UnknownError((0, 0))`.
    pub fn from_buf(buf: [u8; 32]) -> Self {
        let err_1 = buf[8];
        let err_2 = buf[9];

        match err_1 {
            0b0000_0001 => Self::NoMedia,
            0b0000_0010 => Self::EndOfMedia,
            0b0000_0100 => Self::CutterJam,
            0b0000_1000 => Self::WeakBatteries,
            0b0100_0000 => Self::HighVoltageAdapter,
            _ => match err_2 {
                0b0000_0001 => Self::InvalidMedia,
                0b0000_0010 => Self::BufferFull,
                0b0001_0000 => Self::CoverOpen,
                0b0010_0000 => Self::Overheating,
                _ => Self::UnknownError((err_1, err_2)),
            },
        }
    }

    pub fn is_no_error(&self) -> bool {
        matches!(self, Self::UnknownError((0, 0)))
    }
}
