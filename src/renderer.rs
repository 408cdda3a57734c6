//! # Departure Board Rendering
//!
//! This module lays out one frame of the board against any [`Surface`]. The layout
//! is a pure function of the service store, the paging state and the current time:
//!
//! ```text
//! row 1  14:32 Marylebone                      On time   <- primary summary
//! row 2  Calling at: Gerrards Cross, Denham Golf C...    <- status / scroll
//! row 3  14:47 Marylebone                        14:52   <- next summary
//!                        14:31:07                        <- clock
//! ```
//!
//! Every call clears and re-presents the whole frame; there is no partial redraw.

use crate::config::{DisplayConfig, TimingConfig};
use crate::paging::BoardState;
use crate::surface::{Font, Surface};
use crate::{ServiceRecord, ServiceStore, LIST_SEPARATOR};
use chrono::{Local, NaiveTime};
use std::time::Instant;

/// Prefix drawn in front of the scrolling calling-point window.
pub const CALLING_PREFIX: &str = "Calling at: ";

/// Padding between the end of the list and its repeat.
const SCROLL_PADDING: &str = "   ";

/// Time inputs for a single frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTime {
    /// Wall-clock time shown by the clock
    pub wall: NaiveTime,
    /// Monotonic milliseconds used only for blink parity
    pub millis: u64,
}

impl FrameTime {
    /// Local wall time plus milliseconds elapsed since `epoch`.
    pub fn now(epoch: Instant) -> Self {
        Self {
            wall: Local::now().time(),
            millis: epoch.elapsed().as_millis() as u64,
        }
    }
}

/// Pixel positions of the board's rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub width: i32,
    pub row_height: i32,
    pub etd_gutter: i32,
    pub char_width: i32,
    pub clock_baseline: i32,
}

impl Layout {
    fn baseline(&self, row: i32) -> i32 {
        self.row_height * row
    }
}

impl From<&DisplayConfig> for Layout {
    fn from(display: &DisplayConfig) -> Self {
        Self {
            width: display.width,
            row_height: display.row_height,
            etd_gutter: display.etd_gutter,
            char_width: display.char_width.max(1),
            clock_baseline: display.clock_baseline,
        }
    }
}

/// Blink half-periods in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlinkPeriods {
    pub cancelled_ms: u64,
    pub delayed_ms: u64,
}

impl From<&TimingConfig> for BlinkPeriods {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            cancelled_ms: timing.cancel_blink_ms.max(1),
            delayed_ms: timing.delay_blink_ms.max(1),
        }
    }
}

/// True during the "on" half of a blink with the given half-period.
///
/// Phase comes from the clock, not from a counter, so every element
/// blinking at the same period stays in step.
pub fn blink_visible(millis: u64, half_period_ms: u64) -> bool {
    (millis / half_period_ms.max(1)) % 2 == 0
}

/// Drop characters from the end of `text` until it measures at most `max_width`.
pub fn truncate_to_width<S: Surface + ?Sized>(
    surface: &S,
    font: Font,
    text: &str,
    max_width: i32,
) -> String {
    let mut line = text.to_string();
    while !line.is_empty() && surface.measure_width(font, &line) > max_width {
        line.pop();
    }
    line
}

/// Replace a trailing journey-list separator with a full stop.
///
/// Accepts both the spaced separator and a bare comma. Text that does not end
/// in a separator is returned unchanged.
pub fn terminate_list(text: &str) -> String {
    let trimmed = text
        .strip_suffix(LIST_SEPARATOR)
        .or_else(|| text.strip_suffix(','));
    match trimmed {
        Some(stops) => format!("{}.", stops),
        None => text.to_string(),
    }
}

/// Doubled scroll source: the cleaned list, padding, then the same again.
pub fn scroll_source(calling_text: &str) -> String {
    let padded = format!("{}{}", terminate_list(calling_text), SCROLL_PADDING);
    padded.repeat(2)
}

/// The visible slice `offset .. offset + visible` of `source`, in characters.
///
/// An offset at or past the end of `source` restarts from zero.
pub fn scroll_window(source: &str, offset: usize, visible: usize) -> String {
    let offset = if offset >= source.chars().count() {
        0
    } else {
        offset
    };
    source.chars().skip(offset).take(visible).collect()
}

/// Stateless frame renderer for the departure board.
#[derive(Clone, Copy, Debug)]
pub struct BoardRenderer {
    layout: Layout,
    blink: BlinkPeriods,
}

impl BoardRenderer {
    pub fn new(layout: Layout, blink: BlinkPeriods) -> Self {
        Self { layout, blink }
    }

    pub fn from_config(display: &DisplayConfig, timing: &TimingConfig) -> Self {
        Self::new(Layout::from(display), BlinkPeriods::from(timing))
    }

    /// Draw one complete frame.
    pub fn render<S: Surface>(
        &self,
        surface: &mut S,
        store: &ServiceStore,
        state: &BoardState,
        time: FrameTime,
    ) -> Result<(), S::Error> {
        surface.clear()?;

        if let Some(primary) = store.get(state.view_index) {
            self.draw_summary(surface, primary, self.layout.baseline(1))?;
            self.draw_status(surface, primary, state, time.millis)?;
        }

        // Out-of-range and empty slots both come back as None
        if let Some(next) = store.get(state.view_index + 1) {
            self.draw_summary(surface, next, self.layout.baseline(3))?;
        }

        self.draw_clock(surface, time.wall)?;
        surface.present()
    }

    /// Scheduled time and destination on the left, estimate right-aligned.
    fn draw_summary<S: Surface>(
        &self,
        surface: &mut S,
        service: &ServiceRecord,
        y: i32,
    ) -> Result<(), S::Error> {
        let etd_x = self.layout.width - surface.measure_width(Font::Body, &service.estimated);
        let summary = format!("{} {}", service.scheduled, service.destination);
        let line = truncate_to_width(
            &*surface,
            Font::Body,
            &summary,
            etd_x - self.layout.etd_gutter,
        );

        surface.draw_text(Font::Body, 0, y, &line)?;
        surface.draw_text(Font::Body, etd_x, y, &service.estimated)
    }

    /// Cancellation, delay, or the scrolling calling-point list.
    fn draw_status<S: Surface>(
        &self,
        surface: &mut S,
        service: &ServiceRecord,
        state: &BoardState,
        millis: u64,
    ) -> Result<(), S::Error> {
        let y = self.layout.baseline(2);

        if service.cancelled {
            if blink_visible(millis, self.blink.cancelled_ms) {
                surface.draw_text(Font::Body, 0, y, "[!] CANCELLED")?;
            }
            return Ok(());
        }

        if service.is_delayed() && state.delay_phase {
            if blink_visible(millis, self.blink.delayed_ms) {
                let message = format!("[!] Delayed: {}", service.estimated);
                surface.draw_text(Font::Body, 0, y, &message)?;
            }
            return Ok(());
        }

        let prefix_width = surface.measure_width(Font::Body, CALLING_PREFIX);
        let visible = ((self.layout.width - prefix_width) / self.layout.char_width).max(0);
        let source = scroll_source(&service.calling_text());
        let window = scroll_window(&source, state.scroll_offset, visible as usize);

        surface.draw_text(Font::Body, 0, y, CALLING_PREFIX)?;
        surface.draw_text(Font::Body, prefix_width, y, &window)
    }

    /// HH:MM:SS centred along the bottom edge.
    fn draw_clock<S: Surface>(&self, surface: &mut S, wall: NaiveTime) -> Result<(), S::Error> {
        let text = wall.format("%H:%M:%S").to_string();
        let x = (self.layout.width - surface.measure_width(Font::Clock, &text)) / 2;
        surface.draw_text(Font::Clock, x, self.layout.clock_baseline, &text)
    }
}
