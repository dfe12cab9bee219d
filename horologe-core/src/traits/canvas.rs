//! Drawing surface trait
//!
//! The face is drawn with four primitives. Implementations decide how
//! pixels are stored; the core only issues commands.

use crate::geometry::{Point, Rect};

/// Two-tone palette of a memory LCD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Color {
    Black,
    White,
}

/// Horizontal placement of text inside its frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// A drawing surface for one frame
pub trait Canvas {
    type Error;

    /// Fill the whole surface
    fn clear(&mut self, color: Color) -> Result<(), Self::Error>;

    /// Fill a closed polygon given in screen coordinates
    ///
    /// Fewer than three points draws nothing.
    fn fill_polygon(&mut self, points: &[Point], color: Color) -> Result<(), Self::Error>;

    /// Stroke a 1-pixel line, both endpoints inclusive
    fn draw_line(&mut self, from: Point, to: Point, color: Color) -> Result<(), Self::Error>;

    /// Draw a single line of text clipped to `frame`
    fn draw_text(
        &mut self,
        text: &str,
        frame: Rect,
        align: TextAlign,
        color: Color,
    ) -> Result<(), Self::Error>;
}
