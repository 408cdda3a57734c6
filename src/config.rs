//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the departure-config.toml
//! file. It provides a centralized way to configure the station feed, display layout,
//! board timing and panel wiring.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default configuration file, looked up in the working directory.
pub const CONFIG_FILE: &str = "departure-config.toml";

/// Environment variable that overrides `station.api_key`.
pub const API_KEY_ENV: &str = "DEPARTURE_BOARD_API_KEY";

/// Errors raised while saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("config encode: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Application configuration loaded from departure-config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Live departure feed configuration
    pub station: StationConfig,
    /// Panel geometry and layout
    pub display: DisplayConfig,
    /// Tick cadence, dwell and blink periods
    pub timing: TimingConfig,
}

/// Live departure board feed configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StationConfig {
    /// CRS code of the departure station (e.g., "HDM" for Haddenham & Thame Parkway)
    pub crs: String,
    /// Only show services terminating at this CRS; empty shows everything
    pub destination_crs: String,
    /// Base URL of the GetDepBoardWithDetails endpoint; the station CRS is appended
    pub api_url: String,
    /// Feed API key; empty means "use the environment or run the demo board"
    #[serde(default)]
    pub api_key: String,
}

/// Display and layout configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Panel width in pixels
    pub width: i32,
    /// Panel height in pixels
    pub height: i32,
    /// Body text row height; row N has its baseline at N * row_height
    pub row_height: i32,
    /// Minimum gap between a summary and its right-aligned estimate
    pub etd_gutter: i32,
    /// Average body glyph advance used to size the scrolling window
    pub char_width: i32,
    /// Baseline of the clock text
    pub clock_baseline: i32,
    /// SH1122 wiring (only used with the `hardware` feature)
    pub hardware: HardwareConfig,
}

/// SPI and GPIO wiring for the SH1122 panel
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HardwareConfig {
    /// spidev device node
    pub spi_device: String,
    /// GPIO character device
    pub gpio_chip: String,
    /// Data/command select line (BCM numbering)
    pub dc_pin: u32,
    /// Reset line (BCM numbering)
    pub rst_pin: u32,
    /// SPI clock in Hz
    pub spi_hz: u32,
}

/// Board timing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    /// Driver loop period in milliseconds
    pub tick_ms: u64,
    /// Seconds between feed refreshes
    pub fetch_interval_secs: u64,
    /// Ticks the status line is held before the calling points scroll
    pub hold_ticks: u32,
    /// Half-period of the cancellation blink
    pub cancel_blink_ms: u64,
    /// Half-period of the delay blink
    pub delay_blink_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            station: StationConfig {
                crs: "HDM".to_string(),
                destination_crs: "MYB".to_string(),
                api_url: "https://api1.raildata.org.uk/1010-live-departure-board-dep1_2/LDBWS/api/20220120/GetDepBoardWithDetails".to_string(),
                api_key: String::new(),
            },
            display: DisplayConfig {
                width: 256,  // SH1122 panel
                height: 64,  // SH1122 panel
                row_height: 14,
                etd_gutter: 4,
                char_width: 6, // FONT_6X13 advance
                clock_baseline: 62,
                hardware: HardwareConfig {
                    spi_device: "/dev/spidev0.0".to_string(),
                    gpio_chip: "/dev/gpiochip0".to_string(),
                    dc_pin: 25,
                    rst_pin: 27,
                    spi_hz: 8_000_000,
                },
            },
            timing: TimingConfig {
                tick_ms: 500,
                fetch_interval_secs: 60,
                hold_ticks: 6,
                cancel_blink_ms: 166,
                delay_blink_ms: 333,
            },
        }
    }
}

impl Config {
    /// Load configuration from departure-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded configuration for station: {}", config.station.crs);
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format: {}", e);
                    warn!("Using default configuration (HDM)");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found, using default configuration (HDM)");
                Self::default()
            }
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.station.api_key = key.trim().to_string();
            }
        }
        config
    }

    /// Save current configuration to the given path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    /// True when the feed can be queried.
    pub fn has_api_key(&self) -> bool {
        !self.station.api_key.is_empty()
    }
}
