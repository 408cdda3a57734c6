// GPIO character-device output lines for the SH1122 DC and RST pins
use departure_board_lib::sh1122::{GpioPin, PanelError};
use linux_embedded_hal::gpio_cdev::{Chip, LineHandle, LineRequestFlags};

pub struct CdevOutputPin {
    line: LineHandle,
}

impl CdevOutputPin {
    pub fn new(chip: &mut Chip, offset: u32) -> Result<Self, PanelError> {
        let line = chip
            .get_line(offset)
            .map_err(|e| PanelError(e.to_string()))?
            .request(LineRequestFlags::OUTPUT, 1, "departure-board")
            .map_err(|e| PanelError(e.to_string()))?;
        Ok(Self { line })
    }
}

impl GpioPin for CdevOutputPin {
    fn set_high(&mut self) -> Result<(), PanelError> {
        self.line.set_value(1).map_err(|e| PanelError(e.to_string()))
    }
    fn set_low(&mut self) -> Result<(), PanelError> {
        self.line.set_value(0).map_err(|e| PanelError(e.to_string()))
    }
}
