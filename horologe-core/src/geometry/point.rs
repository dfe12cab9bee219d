//! Integer screen coordinates
//!
//! Origin is the top-left pixel; y grows downward.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A pixel position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl core::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl core::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Rectangle at the origin covering `size`
    pub const fn from_size(size: Size) -> Self {
        Self {
            origin: Point::new(0, 0),
            size,
        }
    }

    /// Center pixel, rounding toward the origin
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width as i32 / 2,
            self.origin.y + self.size.height as i32 / 2,
        )
    }

    /// One past the right edge
    pub fn right(&self) -> i32 {
        self.origin.x + self.size.width as i32
    }

    /// One past the bottom edge
    pub fn bottom(&self) -> i32 {
        self.origin.y + self.size.height as i32
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < self.right()
            && point.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_of_screen() {
        let screen = Rect::from_size(Size::new(144, 168));
        assert_eq!(screen.center(), Point::new(72, 84));
    }

    #[test]
    fn test_center_of_offset_rect() {
        let rect = Rect::new(60, 146, 5, 68);
        assert_eq!(rect.center(), Point::new(62, 180));
    }

    #[test]
    fn test_contains_is_half_open() {
        let rect = Rect::new(4, 146, 27, 20);
        assert!(rect.contains(Point::new(4, 146)));
        assert!(rect.contains(Point::new(30, 165)));
        assert!(!rect.contains(Point::new(31, 165)));
        assert!(!rect.contains(Point::new(30, 166)));
    }
}
