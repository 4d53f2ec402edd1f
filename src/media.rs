/// Laminated tape widths supported by PT series printers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TapeWidth {
    Tape3_5,
    Tape6,
    Tape9,
    Tape12,
    Tape18,
    Tape24,
    Tape36,
}

impl TapeWidth {
    /// Decode the media width byte (mm) of a status reply.
    ///
    /// 3.5mm tape is reported as 4.
    pub fn from_mm(mm: u8) -> Option<Self> {
        match mm {
            4 => Some(Self::Tape3_5),
            6 => Some(Self::Tape6),
            9 => Some(Self::Tape9),
            12 => Some(Self::Tape12),
            18 => Some(Self::Tape18),
            24 => Some(Self::Tape24),
            36 => Some(Self::Tape36),
            _ => None,
        }
    }

    pub fn from_buf(buf: [u8; 32]) -> Option<Self> {
        Self::from_mm(buf[10])
    }

    /// Printable pixels across the tape at 180 dpi.
    pub fn pixels(&self) -> u32 {
        match self {
            Self::Tape3_5 => 24,
            Self::Tape6 => 32,
            Self::Tape9 => 52,
            Self::Tape12 => 76,
            Self::Tape18 => 120,
            Self::Tape24 => 128,
            Self::Tape36 => 192,
        }
    }

    pub fn mm(&self) -> f32 {
        match self {
            Self::Tape3_5 => 3.5,
            Self::Tape6 => 6.0,
            Self::Tape9 => 9.0,
            Self::Tape12 => 12.0,
            Self::Tape18 => 18.0,
            Self::Tape24 => 24.0,
            Self::Tape36 => 36.0,
        }
    }
}
