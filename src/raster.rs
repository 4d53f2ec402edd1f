//! Bitmap to printer raster conversion.
//!
//! Each bitmap column becomes one raster line. Lines are packed most
//! significant byte last, bottom row first, and centered on the print head.

use log::{debug, error, info, warn};
use std::time::{Duration, Instant};

use crate::bitmap::Bitmap;
use crate::driver::PrinterDriver;
use crate::error::Error;

/// Pixels whose masked value is zero are printed.
pub const THRESHOLD_MASK: u32 = 0xF0F0F0;

/// Vertical shift that centers an image `height` pixels tall on a print
/// head of `max_pixels` pins. Negative when the image is taller.
pub fn center_offset(max_pixels: u32, height: u32) -> i64 {
    (max_pixels / 2) as i64 - (height / 2) as i64
}

/// Whether a `0xRRGGBB` pixel is dark enough to print.
pub fn is_mark(rgb: u32) -> bool {
    rgb & THRESHOLD_MASK == 0
}

/// Build the raster line for column `x`.
///
/// Pixels shifted outside the line by `offset` are dropped.
pub fn raster_line(bitmap: &Bitmap, x: u32, line_len: usize, offset: i64) -> Vec<u8> {
    let mut line = vec![0u8; line_len];
    let height = bitmap.height();
    let bits = (line_len * 8) as i64;

    for y in 0..height {
        if !is_mark(bitmap.rgb(x, height - 1 - y)) {
            continue;
        }
        let pos = y as i64 + offset;
        if pos < 0 || pos >= bits {
            continue;
        }
        line[line_len - 1 - (pos / 8) as usize] |= 1 << (pos % 8);
    }

    line
}

/// Time source for the completion poll.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

/// Bounds for waiting on the printer after eject.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: Duration::from_millis(100),
            max_polls: 600,
            timeout: Duration::from_secs(60),
        }
    }
}

impl PollPolicy {
    pub fn timeout(self, timeout: Duration) -> Self {
        PollPolicy { timeout, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Completion {
    /// The printer reported it is ready again.
    Completed,
    /// The poll bounds ran out first.
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintReport {
    pub columns: u32,
    /// Raster lines the printer refused.
    pub failed_lines: u32,
    pub completion: Completion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RasterState {
    Idle,
    Sending,
    AwaitingCompletion,
    Done,
}

/// Streams a finished bitmap to a printer.
pub struct Rasterizer<'a, D: PrinterDriver, C: Clock> {
    driver: &'a mut D,
    clock: C,
    policy: PollPolicy,
    state: RasterState,
}

impl<'a, D: PrinterDriver> Rasterizer<'a, D, SystemClock> {
    pub fn new(driver: &'a mut D) -> Self {
        Self::with_clock(driver, SystemClock)
    }
}

impl<'a, D: PrinterDriver, C: Clock> Rasterizer<'a, D, C> {
    pub fn with_clock(driver: &'a mut D, clock: C) -> Self {
        Rasterizer {
            driver,
            clock,
            policy: PollPolicy::default(),
            state: RasterState::Idle,
        }
    }

    pub fn policy(self, policy: PollPolicy) -> Self {
        Rasterizer { policy, ..self }
    }

    pub fn state(&self) -> RasterState {
        self.state
    }

    /// Send every column of `bitmap`, eject and wait for the printer.
    ///
    /// A raster line the printer refuses is logged and skipped; the job
    /// continues. Errors while starting, ejecting or polling abort.
    pub fn print(&mut self, bitmap: &Bitmap) -> Result<PrintReport, Error> {
        let max_pixels = self.driver.max_print_width();
        let line_len = (max_pixels / 8) as usize;
        let offset = center_offset(max_pixels, bitmap.height());

        self.state = RasterState::Sending;
        debug!(
            "Sending {} columns, {} bytes per line, offset {}",
            bitmap.width(),
            line_len,
            offset
        );
        self.driver.start_raster(bitmap.width())?;

        let mut failed_lines = 0;
        for x in 0..bitmap.width() {
            let line = raster_line(bitmap, x, line_len, offset);
            if let Err(err) = self.driver.send_raster_line(&line) {
                error!("Error when printing column {}: {}", x, err);
                failed_lines += 1;
            }
        }

        self.driver.eject()?;
        self.state = RasterState::AwaitingCompletion;

        let completion = self.wait_for_completion()?;
        self.state = RasterState::Done;

        Ok(PrintReport {
            columns: bitmap.width(),
            failed_lines,
            completion,
        })
    }

    fn wait_for_completion(&mut self) -> Result<Completion, Error> {
        let start = self.clock.now();

        for poll in 0..self.policy.max_polls {
            if let Some(status) = self.driver.read_status()? {
                debug!("Status after eject: {:?}", status);
                if status.is_print_finished() {
                    info!("Print finished after {} polls", poll + 1);
                    return Ok(Completion::Completed);
                }
            }
            if self.clock.now().duration_since(start) >= self.policy.timeout {
                break;
            }
            self.clock.sleep(self.policy.interval);
        }

        warn!("Printer did not report completion");
        Ok(Completion::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{BLACK, WHITE};
    use crate::driver::StatusReport;
    use image::Rgb;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::collections::VecDeque;

    fn filled(width: u32, height: u32, color: Rgb<u8>) -> Bitmap {
        let mut bitmap = Bitmap::new(width, height);
        bitmap.fill_rect(0, 0, width, height, color);
        bitmap
    }

    #[test]
    fn threshold_uses_upper_nibbles() {
        assert!(is_mark(0x000000));
        assert!(is_mark(0x0F0F0F));
        assert!(!is_mark(0x100000));
        assert!(!is_mark(0x000010));
        assert!(!is_mark(0x808080));
        assert!(!is_mark(0xFFFFFF));
    }

    #[test]
    fn offset_centers_image() {
        assert_eq!(center_offset(128, 76), 26);
        assert_eq!(center_offset(128, 24), 52);
        assert_eq!(center_offset(128, 200), -36);
    }

    #[test]
    fn dark_column_sets_every_in_range_bit() {
        let bitmap = filled(3, 16, BLACK);
        for x in 0..3 {
            assert_eq!(raster_line(&bitmap, x, 2, 0), vec![0xFF, 0xFF]);
        }
    }

    #[test]
    fn light_column_is_empty() {
        let bitmap = filled(2, 16, WHITE);
        assert_eq!(raster_line(&bitmap, 0, 16, 56), vec![0u8; 16]);
    }

    #[test]
    fn offset_shifts_bits_towards_front() {
        let bitmap = filled(1, 8, BLACK);
        // rows land on bits 60..67, straddling bytes 8 and 7
        let line = raster_line(&bitmap, 0, 16, 60);
        let mut expected = vec![0u8; 16];
        expected[8] = 0xF0;
        expected[7] = 0x0F;
        assert_eq!(line, expected);
    }

    #[test]
    fn rows_are_sent_bottom_first() {
        let mut bitmap = Bitmap::new(1, 8);
        // only the bottom row is dark
        bitmap.put(0, 7, BLACK);
        assert_eq!(raster_line(&bitmap, 0, 1, 0), vec![0b0000_0001]);

        let mut bitmap = Bitmap::new(1, 8);
        bitmap.put(0, 0, BLACK);
        assert_eq!(raster_line(&bitmap, 0, 1, 0), vec![0b1000_0000]);
    }

    #[test]
    fn checkerboard_alternates() {
        let mut bitmap = Bitmap::new(2, 16);
        for y in 0..16 {
            for x in 0..2 {
                if (x + y) % 2 == 0 {
                    bitmap.put(x as i64, y as i64, BLACK);
                }
            }
        }
        // H-1-y flips row parity: column 0 marks odd bit positions
        assert_eq!(raster_line(&bitmap, 0, 2, 0), vec![0xAA, 0xAA]);
        assert_eq!(raster_line(&bitmap, 1, 2, 0), vec![0x55, 0x55]);
    }

    #[test]
    fn bits_outside_line_are_dropped() {
        let bitmap = filled(1, 24, BLACK);
        // 24 rows shifted down by 4 into 16 bits
        assert_eq!(raster_line(&bitmap, 0, 2, -4), vec![0xFF, 0xFF]);
        assert_eq!(raster_line(&bitmap, 0, 2, 12), vec![0xF0, 0x00]);
    }

    /// Clock that only moves when slept on.
    struct FakeClock {
        start: Instant,
        elapsed: Cell<Duration>,
    }

    impl FakeClock {
        fn new() -> Self {
            FakeClock {
                start: Instant::now(),
                elapsed: Cell::new(Duration::from_secs(0)),
            }
        }
    }

    impl Clock for &FakeClock {
        fn now(&self) -> Instant {
            self.start + self.elapsed.get()
        }

        fn sleep(&self, duration: Duration) {
            self.elapsed.set(self.elapsed.get() + duration);
        }
    }

    #[derive(Default)]
    struct FakeDriver {
        lines: Vec<Vec<u8>>,
        started: Option<u32>,
        ejected: bool,
        failing_lines: Vec<usize>,
        statuses: VecDeque<Option<StatusReport>>,
        polls: u32,
    }

    impl PrinterDriver for FakeDriver {
        fn dpi(&self) -> u32 {
            180
        }

        fn max_print_width(&self) -> u32 {
            16
        }

        fn tape_width(&self) -> u32 {
            8
        }

        fn start_raster(&mut self, columns: u32) -> Result<(), Error> {
            self.started = Some(columns);
            Ok(())
        }

        fn send_raster_line(&mut self, line: &[u8]) -> Result<(), Error> {
            let index = self.lines.len();
            self.lines.push(line.to_vec());
            if self.failing_lines.contains(&index) {
                return Err(Error::InvalidResponse(0));
            }
            Ok(())
        }

        fn eject(&mut self) -> Result<(), Error> {
            self.ejected = true;
            Ok(())
        }

        fn read_status(&mut self) -> Result<Option<StatusReport>, Error> {
            self.polls += 1;
            Ok(self.statuses.pop_front().flatten())
        }
    }

    const FINISHED: StatusReport = StatusReport {
        phase_type: 0,
        status_type: 6,
    };
    const PRINTING: StatusReport = StatusReport {
        phase_type: 1,
        status_type: 6,
    };

    #[test]
    fn prints_every_column_then_completes() {
        let mut driver = FakeDriver {
            statuses: vec![None, Some(PRINTING), Some(FINISHED)].into(),
            ..FakeDriver::default()
        };
        let clock = FakeClock::new();
        let bitmap = filled(5, 8, BLACK);

        let mut rasterizer = Rasterizer::with_clock(&mut driver, &clock);
        assert_eq!(rasterizer.state(), RasterState::Idle);
        let report = rasterizer.print(&bitmap).unwrap();
        assert_eq!(rasterizer.state(), RasterState::Done);

        assert_eq!(
            report,
            PrintReport {
                columns: 5,
                failed_lines: 0,
                completion: Completion::Completed,
            }
        );
        assert_eq!(driver.started, Some(5));
        assert!(driver.ejected);
        assert_eq!(driver.polls, 3);
        // 8 rows centered on 16 pins: offset 4
        assert!(driver.lines.iter().all(|l| l == &vec![0x0F, 0xF0]));
    }

    #[test]
    fn failed_lines_do_not_abort() {
        let mut driver = FakeDriver {
            failing_lines: vec![1, 3],
            statuses: vec![Some(FINISHED)].into(),
            ..FakeDriver::default()
        };
        let clock = FakeClock::new();
        let bitmap = filled(6, 8, WHITE);

        let report = Rasterizer::with_clock(&mut driver, &clock)
            .print(&bitmap)
            .unwrap();

        assert_eq!(report.failed_lines, 2);
        assert_eq!(driver.lines.len(), 6);
        assert!(driver.ejected);
        assert_eq!(report.completion, Completion::Completed);
    }

    #[test]
    fn silent_printer_times_out() {
        let mut driver = FakeDriver::default();
        let clock = FakeClock::new();
        let policy = PollPolicy {
            interval: Duration::from_millis(500),
            max_polls: 1000,
            timeout: Duration::from_secs(5),
        };

        let report = Rasterizer::with_clock(&mut driver, &clock)
            .policy(policy)
            .print(&filled(1, 8, WHITE))
            .unwrap();

        assert_eq!(report.completion, Completion::TimedOut);
        // polls at 0.0s, 0.5s, ... 5.0s
        assert_eq!(driver.polls, 11);
        assert_eq!(clock.elapsed.get(), Duration::from_secs(5));
    }

    #[test]
    fn poll_count_is_bounded() {
        let mut driver = FakeDriver {
            statuses: vec![Some(PRINTING); 10].into(),
            ..FakeDriver::default()
        };
        let clock = FakeClock::new();
        let policy = PollPolicy {
            interval: Duration::from_millis(10),
            max_polls: 4,
            timeout: Duration::from_secs(60),
        };

        let report = Rasterizer::with_clock(&mut driver, &clock)
            .policy(policy)
            .print(&filled(1, 8, WHITE))
            .unwrap();

        assert_eq!(report.completion, Completion::TimedOut);
        assert_eq!(driver.polls, 4);
    }
}
