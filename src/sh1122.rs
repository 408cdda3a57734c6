//! SH1122 256x64 greyscale OLED driver
//!
//! The controller takes 4 bits per pixel, two pixels per byte with the left pixel
//! in the high nibble. The board is monochrome, so lit pixels are sent at full
//! brightness and everything else as black.
//!
//! Commands follow the SH1122 datasheet initialisation sequence (the same one
//! U8g2 uses for the 256x64 module).

use crate::graphics::{FrameBuffer, Panel};
use log::{debug, info};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Panel dimensions
pub const PANEL_WIDTH: u32 = 256;
pub const PANEL_HEIGHT: u32 = 64;

/// Grey level used for lit pixels (0x0 - 0xF).
const LIT: u8 = 0x0F;

/// Error raised by the panel or its bus.
#[derive(Error, Debug)]
#[error("SH1122 error: {0}")]
pub struct PanelError(pub String);

/// Byte-oriented SPI link to the controller (chip select handled by the bus)
pub trait SpiWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), PanelError>;
}

/// Trait for GPIO output pins
pub trait GpioPin {
    fn set_high(&mut self) -> Result<(), PanelError>;
    fn set_low(&mut self) -> Result<(), PanelError>;
}

/// Pack one row of the frame into greyscale nibbles.
pub fn greyscale_row(frame: &FrameBuffer, y: i32) -> Vec<u8> {
    (0..frame.width() as i32)
        .step_by(2)
        .map(|x| {
            let left = if frame.pixel(x, y) { LIT << 4 } else { 0 };
            let right = if frame.pixel(x + 1, y) { LIT } else { 0 };
            left | right
        })
        .collect()
}

/// SH1122 display driver
pub struct Sh1122<SPI, DC, RST> {
    spi: SPI,
    dc_pin: DC,
    rst_pin: RST,
    height: u32,
}

impl<SPI, DC, RST> Sh1122<SPI, DC, RST>
where
    SPI: SpiWriter,
    DC: GpioPin,
    RST: GpioPin,
{
    pub fn new(spi: SPI, dc_pin: DC, rst_pin: RST) -> Self {
        Self {
            spi,
            dc_pin,
            rst_pin,
            height: PANEL_HEIGHT,
        }
    }

    /// Hardware reset pulse
    fn reset(&mut self) -> Result<(), PanelError> {
        self.rst_pin.set_high()?;
        thread::sleep(Duration::from_millis(1));
        self.rst_pin.set_low()?;
        thread::sleep(Duration::from_millis(10));
        self.rst_pin.set_high()?;
        thread::sleep(Duration::from_millis(10));
        Ok(())
    }

    fn send_command(&mut self, command: &[u8]) -> Result<(), PanelError> {
        self.dc_pin.set_low()?; // Command mode
        self.spi.write(command)
    }

    fn send_data(&mut self, data: &[u8]) -> Result<(), PanelError> {
        self.dc_pin.set_high()?; // Data mode
        self.spi.write(data)
    }

    /// Reset and configure the controller, leaving the display on and blank.
    pub fn init(&mut self) -> Result<(), PanelError> {
        info!("Initializing SH1122 panel...");
        self.reset()?;

        self.send_command(&[0xAE])?; // Display off
        self.send_command(&[0x40])?; // Display start line 0
        self.send_command(&[0xA0])?; // Segment remap normal
        self.send_command(&[0xC0])?; // COM scan normal
        self.send_command(&[0x81, 0x80])?; // Contrast
        self.send_command(&[0xA8, 0x3F])?; // Multiplex ratio 64
        self.send_command(&[0xAD, 0x81])?; // DC-DC control
        self.send_command(&[0xD5, 0x50])?; // Clock divide
        self.send_command(&[0xD3, 0x00])?; // Display offset
        self.send_command(&[0xD9, 0x22])?; // Pre-charge period
        self.send_command(&[0xDB, 0x35])?; // VCOM deselect level
        self.send_command(&[0xDC, 0x35])?; // VSEGM level
        self.send_command(&[0x30])?; // Discharge level
        self.send_command(&[0xA4])?; // Resume from RAM
        self.send_command(&[0xA6])?; // Normal (not inverted)

        self.clear()?;
        self.send_command(&[0xAF])?; // Display on

        info!("SH1122 panel ready");
        Ok(())
    }

    /// Send a full frame, row by row.
    pub fn display(&mut self, frame: &FrameBuffer) -> Result<(), PanelError> {
        let rows = self.height.min(frame.height());
        for y in 0..rows {
            self.send_command(&[0xB0, y as u8])?; // Row address
            self.send_command(&[0x10, 0x00])?; // Column address 0
            let bytes = greyscale_row(frame, y as i32);
            self.send_data(&bytes)?;
        }
        debug!("SH1122 frame sent ({} lit pixels)", frame.lit_pixels());
        Ok(())
    }

    /// Blank the panel RAM
    pub fn clear(&mut self) -> Result<(), PanelError> {
        let blank = FrameBuffer::new(PANEL_WIDTH, PANEL_HEIGHT);
        self.display(&blank)
    }
}

impl<SPI, DC, RST> Panel for Sh1122<SPI, DC, RST>
where
    SPI: SpiWriter,
    DC: GpioPin,
    RST: GpioPin,
{
    type Error = PanelError;

    fn flush(&mut self, frame: &FrameBuffer) -> Result<(), Self::Error> {
        self.display(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Command(Vec<u8>),
        Data(Vec<u8>),
        Reset(bool),
    }

    #[derive(Default)]
    struct Bus {
        dc_high: bool,
        events: Vec<Event>,
    }

    type Shared = Rc<RefCell<Bus>>;

    struct MockSpi(Shared);
    struct MockDc(Shared);
    struct MockRst(Shared);

    impl SpiWriter for MockSpi {
        fn write(&mut self, bytes: &[u8]) -> Result<(), PanelError> {
            let mut bus = self.0.borrow_mut();
            let event = if bus.dc_high {
                Event::Data(bytes.to_vec())
            } else {
                Event::Command(bytes.to_vec())
            };
            bus.events.push(event);
            Ok(())
        }
    }

    impl GpioPin for MockDc {
        fn set_high(&mut self) -> Result<(), PanelError> {
            self.0.borrow_mut().dc_high = true;
            Ok(())
        }
        fn set_low(&mut self) -> Result<(), PanelError> {
            self.0.borrow_mut().dc_high = false;
            Ok(())
        }
    }

    impl GpioPin for MockRst {
        fn set_high(&mut self) -> Result<(), PanelError> {
            self.0.borrow_mut().events.push(Event::Reset(true));
            Ok(())
        }
        fn set_low(&mut self) -> Result<(), PanelError> {
            self.0.borrow_mut().events.push(Event::Reset(false));
            Ok(())
        }
    }

    struct FailingSpi;

    impl SpiWriter for FailingSpi {
        fn write(&mut self, _bytes: &[u8]) -> Result<(), PanelError> {
            Err(PanelError("bus gone".to_string()))
        }
    }

    fn driver() -> (Sh1122<MockSpi, MockDc, MockRst>, Shared) {
        let bus = Shared::default();
        let panel = Sh1122::new(
            MockSpi(bus.clone()),
            MockDc(bus.clone()),
            MockRst(bus.clone()),
        );
        (panel, bus)
    }

    #[test]
    fn test_greyscale_packs_left_pixel_high() {
        let mut frame = FrameBuffer::new(PANEL_WIDTH, PANEL_HEIGHT);
        frame.set_pixel(0, 3, true);
        frame.set_pixel(3, 3, true);
        frame.set_pixel(4, 3, true);
        frame.set_pixel(5, 3, true);

        let row = greyscale_row(&frame, 3);
        assert_eq!(row.len(), 128);
        assert_eq!(&row[..4], &[0xF0, 0x0F, 0xFF, 0x00]);
        assert!(greyscale_row(&frame, 4).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_init_resets_then_turns_display_on() {
        let (mut panel, bus) = driver();
        panel.init().unwrap();

        let events = &bus.borrow().events;
        assert_eq!(
            &events[..3],
            &[Event::Reset(true), Event::Reset(false), Event::Reset(true)]
        );
        assert_eq!(events[3], Event::Command(vec![0xAE]));
        assert_eq!(events.last(), Some(&Event::Command(vec![0xAF])));
    }

    #[test]
    fn test_display_sends_every_row() {
        let (mut panel, bus) = driver();
        let mut frame = FrameBuffer::new(PANEL_WIDTH, PANEL_HEIGHT);
        frame.set_pixel(10, 63, true);
        panel.flush(&frame).unwrap();

        let events = &bus.borrow().events;
        let data: Vec<&Vec<u8>> = events
            .iter()
            .filter_map(|e| match e {
                Event::Data(bytes) => Some(bytes),
                _ => None,
            })
            .collect();
        assert_eq!(data.len(), 64);
        assert!(data.iter().all(|row| row.len() == 128));
        assert_eq!(data[63][5], 0xF0);
        assert!(events.contains(&Event::Command(vec![0xB0, 63])));
    }

    #[test]
    fn test_bus_errors_propagate() {
        let bus = Shared::default();
        let mut panel = Sh1122::new(FailingSpi, MockDc(bus.clone()), MockRst(bus));
        let frame = FrameBuffer::new(PANEL_WIDTH, PANEL_HEIGHT);
        let err = panel.flush(&frame).unwrap_err();
        assert_eq!(err.to_string(), "SH1122 error: bus gone");
    }
}
