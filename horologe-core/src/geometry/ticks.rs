//! Hour tick marks
//!
//! Twelve quads around the dial, computed once from the face bounds and
//! never rotated afterwards.

use super::path::rotate_point;
use super::point::{Point, Rect};
use crate::traits::canvas::{Canvas, Color};
use crate::trig::Angle;

pub const NUM_CLOCK_TICKS: usize = 12;

/// Points per tick quad
pub const TICK_POINTS: usize = 4;

/// Gap between the dial edge and the outer end of a tick
const EDGE_MARGIN: i32 = 1;

/// Tick at 12, 3, 6 and 9
const MAJOR_LENGTH: i32 = 10;
const MAJOR_HALF_WIDTH: i32 = 2;

const MINOR_LENGTH: i32 = 6;
const MINOR_HALF_WIDTH: i32 = 1;

/// Frozen tick polygons in screen coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickMarks {
    quads: [[Point; TICK_POINTS]; NUM_CLOCK_TICKS],
}

impl TickMarks {
    /// Lay out ticks on the largest circle that fits `bounds`
    pub fn new(bounds: Rect) -> Self {
        let center = bounds.center();
        let radius = bounds.size.width.min(bounds.size.height) as i32 / 2 - EDGE_MARGIN;

        let mut quads = [[Point::default(); TICK_POINTS]; NUM_CLOCK_TICKS];
        for (hour, quad) in quads.iter_mut().enumerate() {
            let (length, half_width) = if hour % 3 == 0 {
                (MAJOR_LENGTH, MAJOR_HALF_WIDTH)
            } else {
                (MINOR_LENGTH, MINOR_HALF_WIDTH)
            };
            let outer = -radius;
            let inner = -radius + length;
            let local = [
                Point::new(-half_width, outer),
                Point::new(half_width, outer),
                Point::new(half_width, inner),
                Point::new(-half_width, inner),
            ];
            let angle = Angle::from_ratio(hour as u32, NUM_CLOCK_TICKS as u32);
            for (out, point) in quad.iter_mut().zip(local) {
                *out = rotate_point(point, angle, center);
            }
        }

        Self { quads }
    }

    /// Tick polygon for `hour` (0 is the 12 o'clock mark)
    pub fn quad(&self, hour: usize) -> Option<&[Point; TICK_POINTS]> {
        self.quads.get(hour)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Point; TICK_POINTS]> {
        self.quads.iter()
    }

    /// Fill every tick in `color`
    pub fn draw<C: Canvas>(&self, canvas: &mut C, color: Color) -> Result<(), C::Error> {
        for quad in &self.quads {
            canvas.fill_polygon(quad, color)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    fn ticks() -> TickMarks {
        TickMarks::new(Rect::from_size(Size::new(144, 168)))
    }

    #[test]
    fn test_twelve_oclock_tick() {
        let ticks = ticks();
        let quad = ticks.quad(0).unwrap();
        assert_eq!(quad[0], Point::new(70, 13));
        assert_eq!(quad[1], Point::new(74, 13));
        assert_eq!(quad[2], Point::new(74, 23));
    }

    #[test]
    fn test_three_oclock_tick_is_rotated() {
        let ticks = ticks();
        let quad = ticks.quad(3).unwrap();
        // Outer edge sits at the right of the dial
        assert_eq!(quad[0].x, 72 + 71);
        assert_eq!(quad[2].x, 72 + 61);
    }

    #[test]
    fn test_ticks_stay_inside_bounds() {
        let bounds = Rect::from_size(Size::new(144, 168));
        let ticks = TickMarks::new(bounds);
        assert_eq!(ticks.iter().count(), NUM_CLOCK_TICKS);
        for quad in ticks.iter() {
            for point in quad {
                assert!(bounds.contains(*point), "{:?}", point);
            }
        }
        assert!(ticks.quad(NUM_CLOCK_TICKS).is_none());
    }
}
