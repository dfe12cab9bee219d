//! Rotatable polygons
//!
//! A [`PathInfo`] is a fixed set of points in local coordinates. A [`Path`]
//! places it on screen with an offset and a rotation. Transformed points
//! are recomputed on demand, the local points never change.

use heapless::Vec;

use super::point::Point;
use crate::trig::{Angle, TRIG_MAX_RATIO};

/// Maximum points in a single path
pub const MAX_PATH_POINTS: usize = 8;

/// Static point set in local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathInfo {
    pub points: &'static [Point],
}

impl PathInfo {
    pub const fn new(points: &'static [Point]) -> Self {
        Self { points }
    }
}

/// A path placed and rotated on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Path {
    info: PathInfo,
    offset: Point,
    rotation: Angle,
}

impl Path {
    pub const fn new(info: PathInfo) -> Self {
        Self {
            info,
            offset: Point::new(0, 0),
            rotation: Angle::ZERO,
        }
    }

    /// Set the screen position of the local origin
    pub fn move_to(&mut self, offset: Point) {
        self.offset = offset;
    }

    /// Set the rotation about the local origin
    pub fn rotate_to(&mut self, rotation: Angle) {
        self.rotation = rotation;
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn rotation(&self) -> Angle {
        self.rotation
    }

    pub fn len(&self) -> usize {
        self.info.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.info.points.is_empty()
    }

    /// Screen points after rotation and offset
    ///
    /// Points beyond [`MAX_PATH_POINTS`] are dropped.
    pub fn points(&self) -> Vec<Point, MAX_PATH_POINTS> {
        let mut out = Vec::new();
        for &point in self.info.points.iter().take(MAX_PATH_POINTS) {
            // Capacity bounded by take() above
            let _ = out.push(rotate_point(point, self.rotation, self.offset));
        }
        out
    }
}

/// Rotate `point` clockwise about the local origin and translate by `offset`
pub fn rotate_point(point: Point, rotation: Angle, offset: Point) -> Point {
    let sin = rotation.sin();
    let cos = rotation.cos();
    Point::new(
        (point.x * cos - point.y * sin) / TRIG_MAX_RATIO + offset.x,
        (point.x * sin + point.y * cos) / TRIG_MAX_RATIO + offset.y,
    )
}
