/*
 *  display/canvas.rs
 *
 *  display-handler - two rows, two protocols
 *  (c) 2023-26 display-handler contributors
 *
 *  Glyph canvas and the two-row text renderer for the bitmap display family
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use core::convert::Infallible;

use chrono::{DateTime, Local};
use embedded_graphics::{
    geometry::{OriginDimensions, Size},
    mono_font::{
        ascii::{FONT_10X20, FONT_9X15},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::{Gray8, GrayColor},
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{renderer::TextRenderer, Baseline, Text},
};

use crate::display::error::DisplayError;
use crate::display::state::{validate_rows, COMPOSITE_INDEX};
use crate::display::DisplayMode;

pub const CANVAS_WIDTH: u32 = 256;
pub const CANVAS_HEIGHT: u32 = 64;

/// Gap between character cells
pub const SPACING: i32 = 4;

/// Baseline rows for the top and bottom lines
pub const TOP_ROW_Y: i32 = 0;
pub const BOTTOM_ROW_Y: i32 = 32;

/// Extra shift of the composite field
const COMPOSITE_NUDGE: i32 = 10;

const CLOCK_X: i32 = 55;
const DATE_Y: i32 = 34;
const DATE_X: i32 = 16;
const DATE_MAX_CHARS: i32 = 17;

/// Font used for both rows and the clock
pub const ROW_FONT: &MonoFont<'static> = &FONT_10X20;

/// Smaller font for the screensaver date
pub const DATE_FONT: &MonoFont<'static> = &FONT_9X15;

/// Monochrome 8-bit luma pixel grid, 0 = black
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphCanvas {
    buf: Vec<u8>,
    w: usize,
    h: usize,
}

impl GlyphCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![0; w * h], w, h }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    pub fn as_slice(&self) -> &[u8] { &self.buf }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.buf[y * self.w..(y + 1) * self.w]
    }

    pub fn luma(&self, x: usize, y: usize) -> Option<u8> {
        (x < self.w && y < self.h).then(|| self.buf[y * self.w + x])
    }

    /// Pixels that are not black
    pub fn lit_count(&self) -> usize {
        self.buf.iter().filter(|&&p| p != 0).count()
    }

    /// Swap rows top to bottom (the panel's origin is bottom-left)
    pub fn flip_vertical(&mut self) {
        let w = self.w;
        for y in 0..self.h / 2 {
            let (upper, lower) = self.buf.split_at_mut((self.h - 1 - y) * w);
            upper[y * w..(y + 1) * w].swap_with_slice(&mut lower[..w]);
        }
    }

    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }
}

impl OriginDimensions for GlyphCanvas {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl DrawTarget for GlyphCanvas {
    type Color = Gray8;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c.luma();
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buf.fill(color.luma());
        Ok(())
    }
}

/// What bottom position 6 shows for a composite value
pub fn composite_glyph(c: char) -> &'static str {
    match c {
        '1' => "ABS",
        ';' => "   ",
        'o' => "T:1",
        'f' => "T:0",
        _ => "***",
    }
}

/// Lays out the two text rows for the bitmap panel
#[derive(Debug, Clone)]
pub struct Renderer {
    row_style: MonoTextStyle<'static, Gray8>,
    date_style: MonoTextStyle<'static, Gray8>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            row_style: MonoTextStyle::new(ROW_FONT, Gray8::WHITE),
            date_style: MonoTextStyle::new(DATE_FONT, Gray8::WHITE),
        }
    }

    /// Width of the reference glyph "A"
    pub fn char_width(&self) -> i32 {
        measure(&self.row_style, "A")
    }

    /// Render and flip, ready for the bitmap container
    pub fn render(&self, top: &str, bottom: &str, mode: DisplayMode) -> Result<GlyphCanvas, DisplayError> {
        self.render_at(top, bottom, mode, Local::now())
    }

    /// As [`Renderer::render`], with the screensaver clock pinned to `now`
    pub fn render_at(
        &self,
        top: &str,
        bottom: &str,
        mode: DisplayMode,
        now: DateTime<Local>,
    ) -> Result<GlyphCanvas, DisplayError> {
        let mut canvas = self.draw(top, bottom, mode, now)?;
        canvas.flip_vertical();
        Ok(canvas)
    }

    /// Draw without the final flip
    pub fn draw(
        &self,
        top: &str,
        bottom: &str,
        mode: DisplayMode,
        now: DateTime<Local>,
    ) -> Result<GlyphCanvas, DisplayError> {
        let mut canvas = GlyphCanvas::new(CANVAS_WIDTH, CANVAS_HEIGHT);
        match mode {
            DisplayMode::Viewership => self.draw_viewership(&mut canvas, top, bottom)?,
            DisplayMode::Messaging => self.draw_messaging(&mut canvas, top, bottom),
            DisplayMode::Screensaver => self.draw_screensaver(&mut canvas, now),
        }
        Ok(canvas)
    }

    fn draw_viewership(&self, canvas: &mut GlyphCanvas, top: &str, bottom: &str) -> Result<(), DisplayError> {
        let (top, bottom) = validate_rows(top, bottom)?;
        let cw = self.char_width();

        for (i, &c) in top.iter().enumerate() {
            let p = i as i32 + 1;
            let x = p * SPACING + (p - 1) * cw;
            self.put_char(canvas, c, x, TOP_ROW_Y);
        }

        for (i, &c) in bottom.iter().enumerate() {
            let p = i as i32 + 1;
            let mut x = p * SPACING + (p - 1) * cw * 2;

            if i == COMPOSITE_INDEX {
                x += COMPOSITE_NUDGE;
                self.put_str(canvas, composite_glyph(c), x, BOTTOM_ROW_Y, &self.row_style);
                continue;
            }

            // gear indicator: a position showing its own digit gets a "G" prefix
            if char::from_digit(p as u32, 10) == Some(c) {
                self.put_str(canvas, "G", x, BOTTOM_ROW_Y, &self.row_style);
                x += SPACING * 4;
            }
            self.put_char(canvas, c, x, BOTTOM_ROW_Y);
        }
        Ok(())
    }

    fn draw_messaging(&self, canvas: &mut GlyphCanvas, top: &str, bottom: &str) {
        let cw = self.char_width();
        for (y, line) in [(TOP_ROW_Y, top), (BOTTOM_ROW_Y, bottom)] {
            for (i, c) in line.chars().enumerate() {
                self.put_char(canvas, c, i as i32 * cw, y);
            }
        }
    }

    fn draw_screensaver(&self, canvas: &mut GlyphCanvas, now: DateTime<Local>) {
        let time = now.format("%I:%M %p").to_string();
        let day = now.format("%A|%d %b %y").to_string();

        let cw = self.char_width();
        for (i, c) in time.chars().enumerate() {
            self.put_char(canvas, c, CLOCK_X + i as i32 * cw, TOP_ROW_Y);
        }

        let dw = measure(&self.date_style, "A");
        let len = day.chars().count() as i32;
        let date_x = date_origin(len, dw);
        for (i, c) in day.chars().enumerate() {
            let mut s = [0u8; 4];
            self.put_str(canvas, c.encode_utf8(&mut s), date_x + i as i32 * dw, DATE_Y, &self.date_style);
        }

        Rectangle::with_corners(Point::new(0, 0), Point::new(CANVAS_WIDTH as i32 - 1, CANVAS_HEIGHT as i32 - 1))
            .into_styled(PrimitiveStyle::with_stroke(Gray8::WHITE, 1))
            .draw(canvas)
            .ok();
    }

    fn put_char(&self, canvas: &mut GlyphCanvas, c: char, x: i32, y: i32) {
        let mut s = [0u8; 4];
        self.put_str(canvas, c.encode_utf8(&mut s), x, y, &self.row_style);
    }

    fn put_str(&self, canvas: &mut GlyphCanvas, s: &str, x: i32, y: i32, style: &MonoTextStyle<'static, Gray8>) {
        Text::with_baseline(s, Point::new(x, y), *style, Baseline::Top)
            .draw(canvas)
            .ok();
    }
}

/// Left edge of a centred date line; overlong lines start left of `DATE_X`,
/// rounded down
fn date_origin(len: i32, char_width: i32) -> i32 {
    DATE_X + ((DATE_MAX_CHARS - len) * char_width).div_euclid(2)
}

fn measure(style: &MonoTextStyle<'static, Gray8>, s: &str) -> i32 {
    style
        .measure_string(s, Point::zero(), Baseline::Top)
        .bounding_box
        .size
        .width as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2023, 6, 22, 12, 30, 0).unwrap()
    }

    fn lit_in(canvas: &GlyphCanvas, x0: usize, x1: usize, y0: usize, y1: usize) -> usize {
        (y0..y1)
            .flat_map(|y| (x0..x1).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.luma(x, y).unwrap_or(0) != 0)
            .count()
    }

    #[test]
    fn test_char_width_is_measured() {
        assert_eq!(Renderer::new().char_width(), 10);
    }

    #[test]
    fn test_viewership_rejects_bad_lengths() {
        let r = Renderer::new();
        let err = r.render("ABC", "123456", DisplayMode::Viewership).unwrap_err();
        assert!(matches!(err, DisplayError::InvalidFormat(_)));
    }

    #[test]
    fn test_messaging_accepts_any_length() {
        let r = Renderer::new();
        let canvas = r.render("Hello there, a long message line", "", DisplayMode::Messaging).unwrap();
        assert!(canvas.lit_count() > 0);
    }

    #[test]
    fn test_viewership_rows_land_in_their_band() {
        let r = Renderer::new();
        let canvas = r.draw("ABCDEFGHIJKL", "------", DisplayMode::Viewership, noon()).unwrap();
        assert!(lit_in(&canvas, 0, 256, 0, 32) > 0);
        // "-" glyphs only in the bottom band, composite "***"
        assert!(lit_in(&canvas, 0, 256, 32, 64) > 0);
    }

    #[test]
    fn test_gear_prefix_drawn() {
        let r = Renderer::new();
        let plain = r.draw("            ", "      ", DisplayMode::Viewership, noon()).unwrap();
        let gear = r.draw("            ", "1     ", DisplayMode::Viewership, noon()).unwrap();
        assert_eq!(lit_in(&plain, 4, 30, 32, 52), 0);
        // "G" in the position 1 cell at x=4, the digit pushed to x=20
        assert!(lit_in(&gear, 4, 14, 32, 52) > 0);
        assert!(lit_in(&gear, 20, 30, 32, 52) > 0);
    }

    #[test]
    fn test_composite_substitution() {
        assert_eq!(composite_glyph('1'), "ABS");
        assert_eq!(composite_glyph(';'), "   ");
        assert_eq!(composite_glyph('o'), "T:1");
        assert_eq!(composite_glyph('f'), "T:0");
        assert_eq!(composite_glyph('0'), "***");

        let r = Renderer::new();
        let blank = r.draw("------------", "-----;", DisplayMode::Viewership, noon()).unwrap();
        // composite field starts at 6*4 + 5*10*2 + 10 = 134
        assert_eq!(lit_in(&blank, 134, 164, 32, 64), 0);
        let abs = r.draw("------------", "-----1", DisplayMode::Viewership, noon()).unwrap();
        assert!(lit_in(&abs, 134, 164, 32, 64) > 0);
    }

    #[test]
    fn test_render_is_flipped() {
        let r = Renderer::new();
        let drawn = r.draw("ABCDEFGHIJKL", "-----;", DisplayMode::Viewership, noon()).unwrap();
        let rendered = r.render_at("ABCDEFGHIJKL", "-----;", DisplayMode::Viewership, noon()).unwrap();
        for y in 0..64 {
            assert_eq!(drawn.row(y), rendered.row(63 - y));
        }
    }

    #[test]
    fn test_screensaver_has_border() {
        let r = Renderer::new();
        let canvas = r.draw("", "", DisplayMode::Screensaver, noon()).unwrap();
        assert_eq!(canvas.luma(0, 0), Some(255));
        assert_eq!(canvas.luma(255, 63), Some(255));
        assert_eq!(canvas.luma(128, 63), Some(255));
        assert_eq!(canvas.luma(0, 40), Some(255));
    }

    #[test]
    fn test_date_origin_rounds_down() {
        assert_eq!(date_origin(17, 9), DATE_X);
        assert_eq!(date_origin(16, 9), DATE_X + 4);
        // "Thursday|21 Sep 23" overflows by one: -9 / 2 rounds to -5
        assert_eq!(date_origin(18, 9), DATE_X - 5);
        // "Wednesday|20 Sep 23"
        assert_eq!(date_origin(19, 9), DATE_X - 9);
    }

    #[test]
    fn test_render_deterministic() {
        let r = Renderer::new();
        let a = r.render_at("ABCDEF------", "12--5o", DisplayMode::Viewership, noon()).unwrap();
        let b = r.render_at("ABCDEF------", "12--5o", DisplayMode::Viewership, noon()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_flip_odd_height() {
        let mut c = GlyphCanvas::new(2, 3);
        Pixel(Point::new(1, 0), Gray8::WHITE).draw(&mut c).unwrap();
        c.flip_vertical();
        assert_eq!(c.luma(1, 2), Some(255));
        assert_eq!(c.luma(1, 0), Some(0));
    }
}
