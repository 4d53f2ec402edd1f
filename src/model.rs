use bitflags::bitflags;

bitflags! {
    /// Protocol quirks of a printer model.
    pub struct ModelFlags: u8 {
        /// Raster lines are framed as a single literal PackBits run.
        const RASTER_PACKBITS = 0b0000_0001;
        /// Needs `ESC i a 1` to switch into raster mode.
        const P700_INIT       = 0b0000_0010;
        /// Expects the `ESC i z` print information command.
        const USE_INFO_CMD    = 0b0000_0100;
    }
}

/// Brother USB vendor id.
pub const VENDOR_ID: u16 = 0x04F9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Model {
    PT2300,
    PT2420PC,
    PT2450PC,
    PT1950,
    PT2700,
    PT1230PC,
    PT2430PC,
    PT2730,
    PTH500,
    PTE500,
    PTP700,
    PTP750W,
    PTD450,
    PTD600,
    PTP710BT,
}

impl Model {
    pub fn all() -> &'static [Model] {
        &[
            Self::PT2300,
            Self::PT2420PC,
            Self::PT2450PC,
            Self::PT1950,
            Self::PT2700,
            Self::PT1230PC,
            Self::PT2430PC,
            Self::PT2730,
            Self::PTH500,
            Self::PTE500,
            Self::PTP700,
            Self::PTP750W,
            Self::PTD450,
            Self::PTD600,
            Self::PTP710BT,
        ]
    }

    pub fn from_pid(pid: u16) -> Option<Self> {
        Self::all().iter().copied().find(|m| m.pid() == pid)
    }

    pub fn pid(&self) -> u16 {
        match self {
            Self::PT2300 => 0x2004,
            Self::PT2420PC => 0x2007,
            Self::PT2450PC => 0x2011,
            Self::PT1950 => 0x2019,
            Self::PT2700 => 0x201F,
            Self::PT1230PC => 0x202C,
            Self::PT2430PC => 0x202D,
            Self::PT2730 => 0x2041,
            Self::PTH500 => 0x205E,
            Self::PTE500 => 0x205F,
            Self::PTP700 => 0x2061,
            Self::PTP750W => 0x2062,
            Self::PTD450 => 0x2073,
            Self::PTD600 => 0x2074,
            Self::PTP710BT => 0x20AF,
        }
    }

    /// Number of pins on the print head.
    pub fn pins(&self) -> u32 {
        match self {
            Self::PT2300 | Self::PT1950 => 112,
            _ => 128,
        }
    }

    pub fn dpi(&self) -> u32 {
        180
    }

    pub fn flags(&self) -> ModelFlags {
        match self {
            Self::PTH500 | Self::PTE500 | Self::PTD450 | Self::PTD600 => {
                ModelFlags::RASTER_PACKBITS
            }
            Self::PTP700 | Self::PTP750W => ModelFlags::RASTER_PACKBITS | ModelFlags::P700_INIT,
            Self::PTP710BT => ModelFlags::RASTER_PACKBITS | ModelFlags::USE_INFO_CMD,
            _ => ModelFlags::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pids_are_unique() {
        for model in Model::all() {
            assert_eq!(Model::from_pid(model.pid()), Some(*model));
        }
    }

    #[test]
    fn unknown_pid() {
        assert_eq!(Model::from_pid(0x209B), None);
    }

    #[test]
    fn print_head_sizes() {
        assert_eq!(Model::PTP700.pins(), 128);
        assert_eq!(Model::PT2300.pins(), 112);
        assert!(Model::all().iter().all(|m| m.pins() % 8 == 0));
    }

    #[test]
    fn p700_needs_extra_init() {
        let flags = Model::PTP700.flags();
        assert!(flags.contains(ModelFlags::P700_INIT));
        assert!(flags.contains(ModelFlags::RASTER_PACKBITS));
        assert!(Model::PT2430PC.flags().is_empty());
    }
}
