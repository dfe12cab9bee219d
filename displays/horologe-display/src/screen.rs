//! 1-bit frame buffer with per-row dirty tracking
//!
//! Rows are stored the way a Sharp memory LCD consumes them: 18 bytes
//! per line, leftmost pixel in the most significant bit, set bit = white.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{Dimensions, DrawTarget, OriginDimensions, Pixel, Size};
use embedded_graphics::primitives::Rectangle;

/// Panel width in pixels
pub const SCREEN_WIDTH: usize = 144;

/// Panel height in pixels
pub const SCREEN_HEIGHT: usize = 168;

/// Bytes per row
pub const ROW_BYTES: usize = SCREEN_WIDTH / 8;

const DIRTY_WORDS: usize = SCREEN_HEIGHT.div_ceil(32);

/// Frame buffer for the watch panel
///
/// Every write marks its row dirty; [`take_dirty_rows`](Self::take_dirty_rows)
/// hands the set to the flusher and starts a new one.
#[derive(Clone)]
pub struct FrameBuffer {
    rows: [[u8; ROW_BYTES]; SCREEN_HEIGHT],
    dirty: DirtyRows,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Black screen, every row dirty
    pub fn new() -> Self {
        Self {
            rows: [[0; ROW_BYTES]; SCREEN_HEIGHT],
            dirty: DirtyRows::all(),
        }
    }

    /// Pixel at `(x, y)`; `None` when off screen
    pub fn pixel(&self, x: i32, y: i32) -> Option<BinaryColor> {
        let (col, bit) = Self::locate(x, y)?;
        let on = self.rows[y as usize][col] & bit != 0;
        Some(BinaryColor::from(on))
    }

    /// Set one pixel; off-screen writes are dropped
    pub fn set_pixel(&mut self, x: i32, y: i32, color: BinaryColor) {
        let Some((col, bit)) = Self::locate(x, y) else {
            return;
        };
        let byte = &mut self.rows[y as usize][col];
        let before = *byte;
        if color.is_on() {
            *byte |= bit;
        } else {
            *byte &= !bit;
        }
        if *byte != before {
            self.dirty.insert(y as usize);
        }
    }

    /// Packed pixels of row `y`
    pub fn row(&self, y: usize) -> Option<&[u8; ROW_BYTES]> {
        self.rows.get(y)
    }

    /// Rows changed since the last call
    pub fn take_dirty_rows(&mut self) -> DirtyRows {
        core::mem::replace(&mut self.dirty, DirtyRows::none())
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Force a full refresh on the next flush
    pub fn mark_all_dirty(&mut self) {
        self.dirty = DirtyRows::all();
    }

    /// Number of white pixels, for tests and diagnostics
    pub fn count_on(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .map(|byte| byte.count_ones() as usize)
            .sum()
    }

    fn locate(x: i32, y: i32) -> Option<(usize, u8)> {
        if x < 0 || y < 0 || x >= SCREEN_WIDTH as i32 || y >= SCREEN_HEIGHT as i32 {
            return None;
        }
        let x = x as usize;
        Some((x / 8, 0x80 >> (x % 8)))
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32)
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
            self.set_pixel(point.x, point.y, color);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        for y in area.top_left.y..=bottom_right.y {
            for x in area.top_left.x..=bottom_right.x {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let fill = if color.is_on() { 0xFF } else { 0x00 };
        for (y, row) in self.rows.iter_mut().enumerate() {
            if row.iter().any(|&b| b != fill) {
                row.fill(fill);
                self.dirty.insert(y);
            }
        }
        Ok(())
    }
}

/// Set of panel rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRows {
    bits: [u32; DIRTY_WORDS],
}

impl DirtyRows {
    pub const fn none() -> Self {
        Self {
            bits: [0; DIRTY_WORDS],
        }
    }

    pub fn all() -> Self {
        let mut rows = Self::none();
        for y in 0..SCREEN_HEIGHT {
            rows.insert(y);
        }
        rows
    }

    pub fn insert(&mut self, y: usize) {
        if y < SCREEN_HEIGHT {
            self.bits[y / 32] |= 1 << (y % 32);
        }
    }

    pub fn contains(&self, y: usize) -> bool {
        y < SCREEN_HEIGHT && self.bits[y / 32] & (1 << (y % 32)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Row indices in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..SCREEN_HEIGHT).filter(move |&y| self.contains(y))
    }
}
