//! Abstract monochrome drawing surface.
//!
//! The board renderer only ever clears the frame, measures text, draws text at a
//! baseline position and presents the finished frame. Anything that can do those
//! four things can show the board: the SH1122 panel, the terminal preview, or the
//! [`RecordingSurface`] used by tests.

use std::convert::Infallible;

/// The two fonts the board uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Font {
    /// Service rows (14 px row pitch)
    Body,
    /// The clock along the bottom edge
    Clock,
}

/// Capability interface for a frame-buffered monochrome display.
pub trait Surface {
    /// Error raised while drawing or presenting.
    type Error;

    /// Blank the whole frame buffer.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Width in pixels `text` would occupy in `font`.
    fn measure_width(&self, font: Font, text: &str) -> i32;

    /// Draw `text` with its left edge at `x` and its baseline at `y`.
    fn draw_text(&mut self, font: Font, x: i32, y: i32, text: &str) -> Result<(), Self::Error>;

    /// Push the frame buffer to the display.
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// One primitive issued against a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawOp {
    Clear,
    Text {
        font: Font,
        x: i32,
        y: i32,
        text: String,
    },
    Present,
}

/// Surface that records every primitive instead of drawing it.
///
/// Text is measured at a fixed advance per character and font, which
/// matches the monospaced fonts used on the real panel.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    body_advance: i32,
    clock_advance: i32,
    ops: Vec<DrawOp>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new(6, 7)
    }
}

impl RecordingSurface {
    pub fn new(body_advance: i32, clock_advance: i32) -> Self {
        Self {
            body_advance,
            clock_advance,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Text drawn with its baseline on row `y`, in draw order.
    pub fn texts_at(&self, y: i32) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { y: op_y, text, .. } if *op_y == y => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// True if any drawn text contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, DrawOp::Text { text, .. } if text.contains(needle)))
    }

    pub fn reset(&mut self) {
        self.ops.clear();
    }
}

impl Surface for RecordingSurface {
    type Error = Infallible;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.ops.push(DrawOp::Clear);
        Ok(())
    }

    fn measure_width(&self, font: Font, text: &str) -> i32 {
        let advance = match font {
            Font::Body => self.body_advance,
            Font::Clock => self.clock_advance,
        };
        text.chars().count() as i32 * advance
    }

    fn draw_text(&mut self, font: Font, x: i32, y: i32, text: &str) -> Result<(), Self::Error> {
        self.ops.push(DrawOp::Text {
            font,
            x,
            y,
            text: text.to_string(),
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.ops.push(DrawOp::Present);
        Ok(())
    }
}
