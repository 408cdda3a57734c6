// Kernel spidev link to the SH1122 (chip select driven by the kernel)
use departure_board_lib::sh1122::{PanelError, SpiWriter};
use linux_embedded_hal::spidev::{SpiModeFlags, Spidev, SpidevOptions};
use std::io::Write;

pub struct SpidevSpi {
    dev: Spidev,
}

impl SpidevSpi {
    pub fn new(path: &str, max_speed_hz: u32) -> Result<Self, PanelError> {
        let mut dev = Spidev::open(path).map_err(|e| PanelError(e.to_string()))?;

        let opts = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(max_speed_hz)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        dev.configure(&opts).map_err(|e| PanelError(e.to_string()))?;
        Ok(Self { dev })
    }
}

impl SpiWriter for SpidevSpi {
    fn write(&mut self, bytes: &[u8]) -> Result<(), PanelError> {
        self.dev
            .write_all(bytes)
            .map_err(|e| PanelError(e.to_string()))
    }
}
