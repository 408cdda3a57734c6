//! # Departure Board Application Entry Point
//!
//! This binary crate drives the board: it refreshes the departures on a fixed
//! cadence, advances the paging engine and renders one frame every tick.
//! It supports both production mode (SH1122 OLED) and development mode
//! (terminal preview).
//!
//! ```text
//! departure-board [--stdout] [--demo] [--config PATH]
//! ```

// Test modules
#[cfg(test)]
mod tests;

#[cfg(all(target_os = "linux", feature = "hardware"))]
mod gpio_sysfs;
#[cfg(all(target_os = "linux", feature = "hardware"))]
mod hw_spi_spidev;

use anyhow::Context;
use departure_board_lib::{
    config::Config,
    demo,
    graphics::{GraphicsSurface, Panel, TerminalPanel},
    paging::PagingEngine,
    renderer::{BoardRenderer, FrameTime},
    services,
    surface::Surface,
    ServiceStore,
};
use log::{info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

/// Command line switches
#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    /// Render to the terminal instead of the panel
    stdout: bool,
    /// Show the built-in sample board instead of the live feed
    demo: bool,
    /// Alternative configuration file
    config_path: Option<String>,
}

impl Options {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Self {
        let mut options = Options::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--stdout" => options.stdout = true,
                "--demo" => options.demo = true,
                "--config" => match args.next() {
                    Some(path) => options.config_path = Some(path),
                    None => warn!("--config needs a path, using the default configuration"),
                },
                other => warn!("Ignoring unknown argument: {}", other),
            }
        }
        options
    }
}

/// Where board refreshes come from.
enum Source {
    Live(tokio::runtime::Runtime),
    Demo,
}

/// The single control loop's state: store, engine and renderer.
struct Board {
    config: Config,
    source: Source,
    store: ServiceStore,
    engine: PagingEngine,
    renderer: BoardRenderer,
    last_refresh: Option<Instant>,
}

impl Board {
    fn new(config: Config, demo_only: bool) -> anyhow::Result<Self> {
        let source = if demo_only || !config.has_api_key() {
            info!("Using the demo board (no live feed)");
            Source::Demo
        } else {
            Source::Live(tokio::runtime::Runtime::new().context("start async runtime")?)
        };

        // The demo board never changes, so it is loaded once and never reset
        let store = match &source {
            Source::Demo => demo::sample_board(),
            Source::Live(_) => ServiceStore::new(),
        };

        Ok(Self {
            renderer: BoardRenderer::from_config(&config.display, &config.timing),
            engine: PagingEngine::new(config.timing.hold_ticks),
            store,
            source,
            config,
            last_refresh: None,
        })
    }

    fn refresh_due(&self, now: Instant) -> bool {
        if matches!(self.source, Source::Demo) {
            return false;
        }
        let interval = Duration::from_secs(self.config.timing.fetch_interval_secs);
        self.last_refresh
            .map_or(true, |last| now.duration_since(last) >= interval)
    }

    /// Replace the store and restart paging. A failed fetch keeps the old board.
    fn refresh(&mut self, now: Instant) {
        match &self.source {
            Source::Live(runtime) => match runtime.block_on(services::fetch(&self.config.station)) {
                Ok(store) => self.store = store,
                Err(error) => {
                    warn!("Departure fetch failed: {}", error);
                    warn!("Keeping the previous board ({} services)", self.store.len());
                }
            },
            Source::Demo => self.store = demo::sample_board(),
        }
        self.engine.reset();
        self.last_refresh = Some(now);
    }

    /// One tick: refresh if due, advance, render.
    fn tick_at<S: Surface>(&mut self, surface: &mut S, time: FrameTime) -> Result<(), S::Error> {
        let now = Instant::now();
        if self.refresh_due(now) {
            self.refresh(now);
        }
        self.engine.advance(&self.store);
        self.renderer
            .render(surface, &self.store, self.engine.state(), time)
    }
}

/// Run the board forever against one panel.
fn run<P>(board: &mut Board, panel: P) -> anyhow::Result<()>
where
    P: Panel,
    P::Error: std::error::Error + Send + Sync + 'static,
{
    let display = &board.config.display;
    let mut surface = GraphicsSurface::new(panel, display.width as u32, display.height as u32);
    let period = Duration::from_millis(board.config.timing.tick_ms);
    let epoch = Instant::now();

    info!(
        "Board running: {} -> {}, tick {} ms",
        board.config.station.crs,
        board.config.station.destination_crs,
        board.config.timing.tick_ms
    );

    loop {
        let started = Instant::now();
        board
            .tick_at(&mut surface, FrameTime::now(epoch))
            .context("present frame")?;
        thread::sleep(period.saturating_sub(started.elapsed()));
    }
}

/// Open and initialise the SH1122 using the configured wiring.
#[cfg(all(target_os = "linux", feature = "hardware"))]
fn open_panel(
    config: &Config,
) -> anyhow::Result<
    departure_board_lib::sh1122::Sh1122<
        hw_spi_spidev::SpidevSpi,
        gpio_sysfs::CdevOutputPin,
        gpio_sysfs::CdevOutputPin,
    >,
> {
    use departure_board_lib::sh1122::Sh1122;
    use gpio_sysfs::CdevOutputPin;
    use hw_spi_spidev::SpidevSpi;
    use linux_embedded_hal::gpio_cdev::Chip;

    let hw = &config.display.hardware;
    info!(
        "SH1122 on {} (DC GPIO {}, RST GPIO {})",
        hw.spi_device, hw.dc_pin, hw.rst_pin
    );

    let mut chip = Chip::new(&hw.gpio_chip).with_context(|| format!("open {}", hw.gpio_chip))?;
    let dc = CdevOutputPin::new(&mut chip, hw.dc_pin)?;
    let rst = CdevOutputPin::new(&mut chip, hw.rst_pin)?;
    let spi = SpidevSpi::new(&hw.spi_device, hw.spi_hz)?;

    let mut panel = Sh1122::new(spi, dc, rst);
    panel.init()?;
    Ok(panel)
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = Options::parse(env::args().skip(1));
    let config = match &options.config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    let mut board = Board::new(config, options.demo)?;

    // Development mode: terminal preview
    if options.stdout {
        return run(&mut board, TerminalPanel::stdout());
    }

    #[cfg(all(target_os = "linux", feature = "hardware"))]
    {
        match open_panel(&board.config) {
            Ok(panel) => return run(&mut board, panel),
            Err(e) => {
                log::error!("SH1122 initialization failed: {:#}", e);
                warn!("Falling back to terminal preview");
            }
        }
    }

    #[cfg(not(all(target_os = "linux", feature = "hardware")))]
    {
        warn!("Panel support not enabled. Rebuild with --features hardware on Linux.");
        warn!("Showing terminal preview instead");
    }

    run(&mut board, TerminalPanel::stdout())
}
