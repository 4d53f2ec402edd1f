use log::{debug, info, warn};
use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, Direction, TransferType, UsbContext};
use std::time::Duration;

use crate::{
    driver::{PrinterDriver, StatusReport},
    error::{Error, PrinterError},
    media::TapeWidth,
    model::{Model, ModelFlags, VENDOR_ID},
};

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    config: u8,
    iface: u8,
    setting: u8,
    address: u8,
}

/// Connection to a P-Touch PT series printer over USB.
///
/// The connection is initialized and its status checked when opened; the
/// USB interface is released when the printer is dropped.
pub struct Printer {
    handle: Box<DeviceHandle<Context>>,
    endpoint_out: Endpoint,
    endpoint_in: Endpoint,
    model: Model,
    status: Status,
    config: PrinterConfig,
}

impl Printer {
    /// Find, open and initialize the first matching printer.
    pub fn open(config: PrinterConfig) -> Result<Self, Error> {
        let mut context = Context::new()?;
        let (mut device, device_desc, handle, model) =
            Self::open_device(&mut context, &config).map_err(|err| {
                debug!("{:?}", err);
                err
            })?;

        handle.reset()?;

        let endpoint_in = Self::find_endpoint(
            &mut device,
            &device_desc,
            Direction::In,
            TransferType::Bulk,
        )
        .ok_or(Error::MissingEndpoint)?;

        let endpoint_out = Self::find_endpoint(
            &mut device,
            &device_desc,
            Direction::Out,
            TransferType::Bulk,
        )
        .ok_or(Error::MissingEndpoint)?;

        // usblp grabs the interface on most Linux systems
        handle.set_auto_detach_kernel_driver(true)?;
        let has_kernel_driver = matches!(handle.kernel_driver_active(endpoint_out.iface), Ok(true));
        info!(" Kernel driver support is {}", has_kernel_driver);
        handle.set_active_configuration(endpoint_out.config)?;
        handle.claim_interface(endpoint_out.iface)?;
        handle.set_alternate_setting(endpoint_out.iface, endpoint_out.setting)?;

        let mut printer = Printer {
            handle: Box::new(handle),
            endpoint_out,
            endpoint_in,
            model,
            status: Status::default(),
            config,
        };

        printer.initialize()?;
        printer.status = printer.check_status()?;
        info!("Connected to {:?}, {:?}", printer.model, printer.status);

        if !printer.status.error.is_no_error() {
            return Err(Error::PrinterError(printer.status.error));
        }
        if printer.status.tape.is_none() {
            return Err(Error::NoMediaInstalled);
        }

        Ok(printer)
    }

    fn open_device(
        context: &mut Context,
        config: &PrinterConfig,
    ) -> Result<(Device<Context>, DeviceDescriptor, DeviceHandle<Context>, Model), Error> {
        let devices = context.devices()?;

        if devices.is_empty() {
            debug!("Failed to read device list");
            return Err(Error::DeviceListNotReadable);
        }
        for device in devices.iter() {
            let device_desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(err) => {
                    debug!("{:?}", err);
                    continue;
                }
            };

            if device_desc.vendor_id() != VENDOR_ID {
                continue;
            }
            let model = match Model::from_pid(device_desc.product_id()) {
                Some(model) => model,
                None => {
                    debug!("Unsupported Brother device {:04X}", device_desc.product_id());
                    continue;
                }
            };
            if config.model.map_or(false, |wanted| wanted != model) {
                continue;
            }

            let handle = match device.open() {
                Ok(handle) => handle,
                Err(err) => {
                    debug!("Failed to open device: {:?}", err);
                    continue;
                }
            };

            match &config.serial {
                None => return Ok((device, device_desc, handle, model)),
                Some(serial) => {
                    let timeout = Duration::from_secs(1);
                    let languages = handle.read_languages(timeout)?;
                    let language = match languages.first() {
                        Some(language) => *language,
                        None => continue,
                    };
                    match handle.read_serial_number_string(language, &device_desc, timeout) {
                        Ok(s) if &s == serial => {
                            return Ok((device, device_desc, handle, model));
                        }
                        Ok(_) => continue,
                        Err(err) => {
                            debug!("Failed to read serial number string: {:?}", err);
                            continue;
                        }
                    }
                }
            }
        }
        debug!("No supported printer found for {:?}", config);
        Err(Error::DeviceOffline)
    }

    fn find_endpoint(
        device: &mut Device<Context>,
        device_desc: &DeviceDescriptor,
        direction: Direction,
        transfer_type: TransferType,
    ) -> Option<Endpoint> {
        for n in 0..device_desc.num_configurations() {
            let config_desc = match device.config_descriptor(n) {
                Ok(c) => c,
                Err(_) => continue,
            };
            for interface in config_desc.interfaces() {
                for interface_desc in interface.descriptors() {
                    for endpoint_desc in interface_desc.endpoint_descriptors() {
                        if endpoint_desc.direction() == direction
                            && endpoint_desc.transfer_type() == transfer_type
                        {
                            return Some(Endpoint {
                                config: config_desc.number(),
                                iface: interface_desc.interface_number(),
                                setting: interface_desc.setting_number(),
                                address: endpoint_desc.address(),
                            });
                        }
                    }
                }
            }
        }
        None
    }

    fn write(&self, buf: &[u8]) -> Result<usize, Error> {
        let n = self
            .handle
            .write_bulk(self.endpoint_out.address, buf, self.config.write_timeout)?;
        if n == buf.len() {
            Ok(n)
        } else {
            debug!(
                "write error: bytes wrote {} != bytes supplied {}, possibly timeout ?",
                n,
                buf.len()
            );
            Err(Error::InvalidResponse(n))
        }
    }

    /// Invalidate any half-received job and reset the printer.
    fn initialize(&self) -> Result<usize, Error> {
        let mut buf: Vec<u8> = vec![0x00; 100];
        buf.extend_from_slice(&[0x1B, 0x40]);
        self.write(&buf)
    }

    /// Request and read a fresh status.
    pub fn check_status(&self) -> Result<Status, Error> {
        self.write(&[0x1B, 0x69, 0x53])?;

        for _ in 0..10 {
            if let Some(status) = self.try_read_status()? {
                return Ok(status);
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        Err(Error::ReadStatusTimeout)
    }

    fn try_read_status(&self) -> Result<Option<Status>, Error> {
        let mut buf: [u8; 32] = [0x00; 32];
        match self
            .handle
            .read_bulk(self.endpoint_in.address, &mut buf, self.config.read_timeout)
        {
            Ok(32) => {
                debug!("Raw status code: {:X?}", buf);
                if buf[0] != 0x80 || buf[1] != 0x20 {
                    return Err(Error::InvalidResponse(32));
                }
                let status = Status::from_buf(buf);
                debug!("Parsed Status struct: {:?}", status);
                Ok(Some(status))
            }
            Ok(_) => Ok(None),
            Err(rusb::Error::Timeout) => Ok(None),
            Err(e) => Err(Error::UsbError(e)),
        }
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn status(&self) -> &Status {
        &self.status
    }
}

impl PrinterDriver for Printer {
    fn dpi(&self) -> u32 {
        self.model.dpi()
    }

    fn max_print_width(&self) -> u32 {
        self.model.pins()
    }

    fn tape_width(&self) -> u32 {
        self.status.tape.map(|t| t.pixels()).unwrap_or(0)
    }

    fn start_raster(&mut self, columns: u32) -> Result<(), Error> {
        let flags = self.model.flags();
        let mut buf: Vec<u8> = Vec::new();

        if flags.contains(ModelFlags::P700_INIT) {
            buf.extend_from_slice(&[0x1B, 0x69, 0x61, 0x01]); // ESC i a : switch to raster mode
        }
        if flags.contains(ModelFlags::USE_INFO_CMD) {
            buf.append(&mut info_command(self.status.media_width_mm, columns));
        }
        buf.extend_from_slice(&[0x1B, 0x69, 0x52, 0x01]); // ESC i R : raster graphics transfer
        if flags.contains(ModelFlags::RASTER_PACKBITS) {
            buf.extend_from_slice(&[0x4D, 0x02]); // M : PackBits compression
        }

        self.write(&buf)?;
        Ok(())
    }

    fn send_raster_line(&mut self, line: &[u8]) -> Result<(), Error> {
        let buf = raster_command(self.model.flags(), line);
        self.write(&buf)?;
        Ok(())
    }

    fn eject(&mut self) -> Result<(), Error> {
        self.write(&[0x1A])?; // Control-Z : Print then Eject
        Ok(())
    }

    fn read_status(&mut self) -> Result<Option<StatusReport>, Error> {
        Ok(self.try_read_status()?.map(|status| status.report()))
    }
}

impl Drop for Printer {
    fn drop(&mut self) {
        if let Err(err) = self.handle.release_interface(self.endpoint_out.iface) {
            warn!("Failed to release printer interface: {:?}", err);
        }
    }
}

/// Frame one raster line.
pub fn raster_command(flags: ModelFlags, line: &[u8]) -> Vec<u8> {
    let mut buf: Vec<u8> = Vec::with_capacity(line.len() + 4);
    buf.push(0x47); // G : raster graphics transfer

    if flags.contains(ModelFlags::RASTER_PACKBITS) {
        // the whole line as one literal run
        buf.extend_from_slice(&[(line.len() + 1) as u8, 0x00, line.len().saturating_sub(1) as u8]);
    } else {
        buf.extend_from_slice(&[line.len() as u8, 0x00]);
    }
    buf.extend_from_slice(line);
    buf
}

/// `ESC i z` print information for a job of `columns` raster lines.
pub fn info_command(media_width_mm: u8, columns: u32) -> Vec<u8> {
    let mut buf = vec![0x1B, 0x69, 0x7A, 0x00, 0x00, media_width_mm, 0x00];
    buf.extend_from_slice(&columns.to_le_bytes());
    buf.extend_from_slice(&[0x00, 0x00]);
    buf
}

///
/// Status received from the printer encoded to Rust friendly type.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    pub error: PrinterError,
    pub media_width_mm: u8,
    pub tape: Option<TapeWidth>,
    pub status_type: StatusType,
    pub phase: Phase,
    pub notification: Notification,
    raw_status_type: u8,
    raw_phase_type: u8,
}

impl Default for Status {
    fn default() -> Self {
        Status::from_buf([0x00; 32])
    }
}

impl Status {
    pub fn from_buf(buf: [u8; 32]) -> Self {
        Status {
            error: PrinterError::from_buf(buf),
            media_width_mm: buf[10],
            tape: TapeWidth::from_buf(buf),
            status_type: StatusType::from_code(buf[18]),
            phase: Phase::from_code(buf[19]),
            notification: Notification::from_code(buf[22]),
            raw_status_type: buf[18],
            raw_phase_type: buf[19],
        }
    }

    pub fn report(&self) -> StatusReport {
        StatusReport {
            phase_type: self.raw_phase_type,
            status_type: self.raw_status_type,
        }
    }
}

// StatusType

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusType {
    ReplyToRequest,
    Completed,
    Error,
    TurnedOff,
    Notification,
    PhaseChange,
    Unknown,
}

impl StatusType {
    fn from_code(code: u8) -> StatusType {
        match code {
            0x00 => Self::ReplyToRequest,
            0x01 => Self::Completed,
            0x02 => Self::Error,
            0x04 => Self::TurnedOff,
            0x05 => Self::Notification,
            0x06 => Self::PhaseChange,
            _ => Self::Unknown,
        }
    }
}

// Phase

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Receiving,
    Printing,
    Unknown(u8),
}

impl Phase {
    fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Receiving,
            0x01 => Self::Printing,
            n => Self::Unknown(n),
        }
    }
}

// Notification

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    NotAvailable,
    CoverOpen,
    CoverClosed,
}

impl Notification {
    fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::CoverOpen,
            0x02 => Self::CoverClosed,
            _ => Self::NotAvailable,
        }
    }
}

/// Config
///
#[derive(Debug, Clone)]
pub struct PrinterConfig {
    model: Option<Model>,
    serial: Option<String>,
    write_timeout: Duration,
    read_timeout: Duration,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PrinterConfig {
    /// Match any supported printer.
    ///
    /// # Example
    ///
    /// ```
    /// use pt_label::{Model, PrinterConfig};
    ///
    /// let config = PrinterConfig::new()
    ///     .model(Model::PTP700)
    ///     .serial("E6Z123456".to_string());
    /// ```
    pub fn new() -> PrinterConfig {
        PrinterConfig {
            model: None,
            serial: None,
            write_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_millis(500),
        }
    }

    /// Only accept this model.
    pub fn model(self, model: Model) -> Self {
        PrinterConfig {
            model: Some(model),
            ..self
        }
    }

    /// Only accept the device with this USB serial number.
    pub fn serial(self, serial: String) -> Self {
        PrinterConfig {
            serial: Some(serial),
            ..self
        }
    }

    pub fn write_timeout(self, write_timeout: Duration) -> Self {
        PrinterConfig {
            write_timeout,
            ..self
        }
    }

    pub fn read_timeout(self, read_timeout: Duration) -> Self {
        PrinterConfig {
            read_timeout,
            ..self
        }
    }
}
