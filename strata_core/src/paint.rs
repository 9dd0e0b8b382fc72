// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel buffers and the clipped painter handed to widgets.
//!
//! Painting is limited to solid fills. A [`Painter`] writes into a
//! [`PixelBuffer`] through a clip region, so a widget can never touch pixels
//! outside the area it was asked to repaint.

use alloc::vec::Vec;
use core::fmt;

use kurbo::{Rect, Size, Vec2};

use crate::region::{Region, intersect, rect_is_empty};

/// A packed `0xAARRGGBB` color.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0x0000_0000);
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self(0xFFFF_FFFF);

    /// Creates a color from 8-bit components.
    #[inline]
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    /// Creates an opaque color from 8-bit components.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 0xFF)
    }

    /// Returns the alpha component.
    #[inline]
    #[must_use]
    pub const fn alpha(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    /// Returns `true` if the color fully covers what is beneath it.
    #[inline]
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        self.alpha() == 0xFF
    }

    /// Composites `self` over `dst` (non-premultiplied source-over).
    #[must_use]
    pub fn over(self, dst: Self) -> Self {
        let sa = u32::from(self.alpha());
        if sa == 0xFF {
            return self;
        }
        if sa == 0 {
            return dst;
        }
        let channel = |shift: u32| {
            let s = (self.0 >> shift) & 0xFF;
            let d = (dst.0 >> shift) & 0xFF;
            (s * sa + d * (0xFF - sa)) / 0xFF
        };
        let da = u32::from(dst.alpha());
        let a = sa + da * (0xFF - sa) / 0xFF;
        Self((a << 24) | (channel(16) << 16) | (channel(8) << 8) | channel(0))
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color(#{:08X})", self.0)
    }
}

// ---------------------------------------------------------------------------
// PixelBuffer
// ---------------------------------------------------------------------------

/// A row-major buffer of [`Color`] pixels.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl PixelBuffer {
    /// Creates a buffer of the given dimensions filled with `fill`.
    #[must_use]
    pub fn new(width: u32, height: u32, fill: Color) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            data: alloc::vec![fill; len],
        }
    }

    /// Creates a buffer covering `size`, rounding each extent up to whole
    /// pixels.
    #[must_use]
    pub fn with_size(size: Size, fill: Color) -> Self {
        Self::new(extent(size.width), extent(size.height), fill)
    }

    /// Buffer width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the buffer bounds as a rectangle at the origin.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Returns the pixel at `(x, y)`, or `None` if out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y as usize * self.width as usize + x as usize])
    }

    /// Returns the raw pixel data.
    #[must_use]
    pub fn pixels(&self) -> &[Color] {
        &self.data
    }

    /// Composites `color` over every pixel inside `rect`.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let Some((x0, x1)) = span(rect.x0, rect.x1, self.width) else {
            return;
        };
        let Some((y0, y1)) = span(rect.y0, rect.y1, self.height) else {
            return;
        };
        let stride = self.width as usize;
        for y in y0..y1 {
            for px in &mut self.data[y * stride + x0..y * stride + x1] {
                *px = color.over(*px);
            }
        }
    }

    /// Composites `color` over every pixel inside `region`.
    pub fn fill_region(&mut self, region: &Region, color: Color) {
        for &r in region.rects() {
            self.fill_rect(r, color);
        }
    }

    /// Copies the pixels inside `source` to `source + delta`.
    ///
    /// Both rectangles are clipped to the buffer; overlapping source and
    /// destination are handled.
    pub fn copy_rect(&mut self, source: Rect, delta: Vec2) {
        let dest = intersect(source + delta, self.bounds());
        let src = intersect(dest - delta, self.bounds());
        let dest = src + delta;
        if rect_is_empty(src) {
            return;
        }
        let (Some((sx0, sx1)), Some((sy0, sy1))) = (
            span(src.x0, src.x1, self.width),
            span(src.y0, src.y1, self.height),
        ) else {
            return;
        };
        let (Some((dx0, _)), Some((dy0, _))) = (
            span(dest.x0, dest.x1, self.width),
            span(dest.y0, dest.y1, self.height),
        ) else {
            return;
        };
        let stride = self.width as usize;
        let w = sx1 - sx0;
        let rows: Vec<usize> = if dy0 > sy0 {
            (0..sy1 - sy0).rev().collect()
        } else {
            (0..sy1 - sy0).collect()
        };
        for row in rows {
            let from = (sy0 + row) * stride + sx0;
            let to = (dy0 + row) * stride + dx0;
            self.data.copy_within(from..from + w, to);
        }
    }
}

/// Converts a floating-point extent to a pixel count, rounding up.
fn extent(v: f64) -> u32 {
    let v = v.max(0.0).min(f64::from(u32::MAX));
    #[expect(
        clippy::cast_possible_truncation,
        reason = "clamped to the u32 range above"
    )]
    let whole = v as u32;
    if f64::from(whole) < v { whole + 1 } else { whole }
}

/// Clamps `[lo, hi)` to `[0, limit)` and returns it as pixel indices.
fn span(lo: f64, hi: f64, limit: u32) -> Option<(usize, usize)> {
    let limit = f64::from(limit);
    let lo = lo.max(0.0).min(limit);
    let hi = hi.max(0.0).min(limit);
    if !(hi > lo) {
        return None;
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "both ends are clamped to the buffer extent"
    )]
    let out = (lo as usize, hi as usize);
    Some(out)
}

// ---------------------------------------------------------------------------
// Painter
// ---------------------------------------------------------------------------

/// Clipped drawing surface handed to a widget during a paint pass.
///
/// Coordinates are widget-local. Every fill is intersected with the region
/// the widget owes, so nothing outside it is touched.
pub struct Painter<'a> {
    buffer: &'a mut PixelBuffer,
    origin: Vec2,
    clip: Region,
}

impl fmt::Debug for Painter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Painter")
            .field("origin", &self.origin)
            .field("clip", &self.clip)
            .finish_non_exhaustive()
    }
}

impl<'a> Painter<'a> {
    /// Creates a painter whose local origin sits at `origin` in the buffer,
    /// restricted to `clip` (buffer coordinates).
    pub(crate) fn new(buffer: &'a mut PixelBuffer, origin: Vec2, clip: Region) -> Self {
        Self {
            buffer,
            origin,
            clip,
        }
    }

    /// Fills `rect` (widget coordinates) with `color`.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let target = self.clip.intersected_rect(rect + self.origin);
        self.buffer.fill_region(&target, color);
    }

    /// Fills `region` (widget coordinates) with `color`.
    pub fn fill_region(&mut self, region: &Region, color: Color) {
        let target = region.translated(self.origin).intersected(&self.clip);
        self.buffer.fill_region(&target, color);
    }

    /// Fills the whole paintable area with `color`.
    pub fn fill(&mut self, color: Color) {
        self.buffer.fill_region(&self.clip, color);
    }

    /// Returns the paintable area in widget coordinates.
    #[must_use]
    pub fn clip(&self) -> Region {
        self.clip.translated(-self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(0xFF, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 0xFF);

    #[test]
    fn fill_rect_is_clamped_to_buffer() {
        let mut buf = PixelBuffer::new(4, 4, Color::WHITE);
        buf.fill_rect(Rect::new(-10.0, 2.0, 10.0, 10.0), RED);
        assert_eq!(buf.pixel(0, 1), Some(Color::WHITE));
        assert_eq!(buf.pixel(0, 2), Some(RED));
        assert_eq!(buf.pixel(3, 3), Some(RED));
        assert_eq!(buf.pixel(4, 0), None);
    }

    #[test]
    fn translucent_fill_blends() {
        let mut buf = PixelBuffer::new(1, 1, Color::BLACK);
        buf.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::rgba(0xFF, 0xFF, 0xFF, 0));
        assert_eq!(buf.pixel(0, 0), Some(Color::BLACK));
        buf.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::rgba(0xFF, 0, 0, 0xFF));
        assert_eq!(buf.pixel(0, 0), Some(RED));
    }

    #[test]
    fn copy_rect_handles_overlap() {
        let mut buf = PixelBuffer::new(6, 1, Color::WHITE);
        buf.fill_rect(Rect::new(0.0, 0.0, 3.0, 1.0), RED);
        buf.copy_rect(Rect::new(0.0, 0.0, 3.0, 1.0), Vec2::new(2.0, 0.0));
        assert_eq!(buf.pixel(0, 0), Some(RED));
        assert_eq!(buf.pixel(2, 0), Some(RED));
        assert_eq!(buf.pixel(4, 0), Some(RED));
        assert_eq!(buf.pixel(5, 0), Some(Color::WHITE));
    }

    #[test]
    fn copy_rect_downward_preserves_rows() {
        let mut buf = PixelBuffer::new(1, 4, Color::WHITE);
        buf.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), RED);
        buf.fill_rect(Rect::new(0.0, 1.0, 1.0, 2.0), BLUE);
        buf.copy_rect(Rect::new(0.0, 0.0, 1.0, 2.0), Vec2::new(0.0, 1.0));
        assert_eq!(buf.pixel(0, 1), Some(RED));
        assert_eq!(buf.pixel(0, 2), Some(BLUE));
    }

    #[test]
    fn painter_respects_clip() {
        let mut buf = PixelBuffer::new(10, 10, Color::WHITE);
        let clip = Region::from_rect(Rect::new(5.0, 5.0, 7.0, 7.0));
        let mut painter = Painter::new(&mut buf, Vec2::new(4.0, 4.0), clip);
        painter.fill(BLUE);
        painter.fill_rect(Rect::new(0.0, 0.0, 100.0, 100.0), RED);
        assert_eq!(painter.clip().bounding_box(), Rect::new(1.0, 1.0, 3.0, 3.0));
        assert_eq!(buf.pixel(5, 5), Some(RED));
        assert_eq!(buf.pixel(4, 4), Some(Color::WHITE));
        assert_eq!(buf.pixel(7, 7), Some(Color::WHITE));
    }
}
