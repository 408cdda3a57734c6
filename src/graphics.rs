//! # Frame Buffer and Text Rasterisation
//!
//! The board is drawn into a 1-bit [`FrameBuffer`] with embedded-graphics mono
//! fonts, then handed to a [`Panel`] when the frame is presented.
//!
//! ## Panels
//! - [`crate::sh1122::Sh1122`]: the 256x64 OLED on SPI (production)
//! - [`TerminalPanel`]: half-block preview on stdout (development mode)

use crate::surface::{Font, Surface};
use embedded_graphics::{
    mono_font::{
        ascii::{FONT_6X13, FONT_7X14},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{renderer::TextRenderer, Baseline, Text},
};
use std::convert::Infallible;
use std::io::{self, Write};

/// Glyphs used for each board font.
pub fn mono_font(font: Font) -> &'static MonoFont<'static> {
    match font {
        Font::Body => &FONT_6X13,
        Font::Clock => &FONT_7X14,
    }
}

/// 1-bit frame buffer, rows of bytes with the leftmost pixel in the MSB.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let bytes_per_row = width.div_ceil(8);
        Self {
            width,
            height,
            bits: vec![0x00; (bytes_per_row * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Turn every pixel off.
    pub fn clear(&mut self) {
        self.bits.fill(0x00);
    }

    fn index(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let bytes_per_row = self.width.div_ceil(8);
        let byte = (y as u32 * bytes_per_row + x as u32 / 8) as usize;
        Some((byte, 0x80 >> (x as u32 % 8)))
    }

    /// Set one pixel; coordinates outside the frame are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, on: bool) {
        if let Some((byte, mask)) = self.index(x, y) {
            if on {
                self.bits[byte] |= mask;
            } else {
                self.bits[byte] &= !mask;
            }
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> bool {
        self.index(x, y)
            .map_or(false, |(byte, mask)| self.bits[byte] & mask != 0)
    }

    /// Number of lit pixels in the frame.
    pub fn lit_pixels(&self) -> u32 {
        self.bits.iter().map(|b| b.count_ones()).sum()
    }

    /// True if any pixel in the half-open rectangle is lit.
    pub fn any_lit(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> bool {
        (y0..y1).any(|y| (x0..x1).any(|x| self.pixel(x, y)))
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color.is_on());
        }
        Ok(())
    }
}

/// Sink that receives each finished frame.
pub trait Panel {
    type Error;

    fn flush(&mut self, frame: &FrameBuffer) -> Result<(), Self::Error>;
}

/// [`Surface`] that rasterises text into a [`FrameBuffer`] and presents it to a [`Panel`].
pub struct GraphicsSurface<P> {
    frame: FrameBuffer,
    panel: P,
}

impl<P: Panel> GraphicsSurface<P> {
    pub fn new(panel: P, width: u32, height: u32) -> Self {
        Self {
            frame: FrameBuffer::new(width, height),
            panel,
        }
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

}

impl<P: Panel> Surface for GraphicsSurface<P> {
    type Error = P::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.frame.clear();
        Ok(())
    }

    fn measure_width(&self, font: Font, text: &str) -> i32 {
        let style = MonoTextStyle::new(mono_font(font), BinaryColor::On);
        style
            .measure_string(text, Point::zero(), Baseline::Alphabetic)
            .next_position
            .x
    }

    fn draw_text(&mut self, font: Font, x: i32, y: i32, text: &str) -> Result<(), Self::Error> {
        let style = MonoTextStyle::new(mono_font(font), BinaryColor::On);
        Text::with_baseline(text, Point::new(x, y), style, Baseline::Alphabetic)
            .draw(&mut self.frame)
            .map_err(|never| match never {})?;
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.panel.flush(&self.frame)
    }
}

/// Development panel: prints each frame as half-block characters.
///
/// Two pixel rows share one text row, so a 256x64 frame becomes 256x32
/// characters framed by a top and bottom border.
pub struct TerminalPanel<W: Write> {
    out: W,
    redraw_in_place: bool,
}

impl TerminalPanel<io::Stdout> {
    /// Preview on stdout, homing the cursor before each frame.
    pub fn stdout() -> Self {
        Self::new(io::stdout(), true)
    }
}

impl<W: Write> TerminalPanel<W> {
    pub fn new(out: W, redraw_in_place: bool) -> Self {
        Self {
            out,
            redraw_in_place,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Panel for TerminalPanel<W> {
    type Error = io::Error;

    fn flush(&mut self, frame: &FrameBuffer) -> Result<(), Self::Error> {
        let width = frame.width() as i32;
        let border = "=".repeat(frame.width() as usize);
        let mut text = String::with_capacity((frame.width() as usize + 1) * 34);

        if self.redraw_in_place {
            text.push_str("\x1b[H\x1b[2J");
        }
        text.push_str(&border);
        text.push('\n');
        for y in (0..frame.height() as i32).step_by(2) {
            for x in 0..width {
                let glyph = match (frame.pixel(x, y), frame.pixel(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                };
                text.push(glyph);
            }
            text.push('\n');
        }
        text.push_str(&border);
        text.push('\n');

        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }
}
