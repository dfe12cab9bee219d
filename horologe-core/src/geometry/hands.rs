//! Hand geometry
//!
//! Maps a [`TimeSample`] to the three hand angles and draws them about the
//! face center. Angle 0 points at 12 and grows clockwise.

use super::path::{Path, PathInfo, MAX_PATH_POINTS};
use super::point::{Point, Rect};
use crate::time::TimeSample;
use crate::traits::canvas::{Canvas, Color};
use crate::trig::{Angle, TRIG_MAX_RATIO};

/// Minute arrow in local coordinates, tip up
pub static MINUTE_HAND_POINTS: [Point; 3] =
    [Point::new(-8, 20), Point::new(8, 20), Point::new(0, -80)];

/// Hour arrow in local coordinates, tip up
pub static HOUR_HAND_POINTS: [Point; 3] =
    [Point::new(-6, 20), Point::new(6, 20), Point::new(0, -60)];

/// Second hand angle: `second / 60` of a turn
pub fn second_angle(second: u8) -> Angle {
    Angle::from_ratio(second as u32, 60)
}

/// Minute hand angle: `minute / 60` of a turn
pub fn minute_angle(minute: u8) -> Angle {
    Angle::from_ratio(minute as u32, 60)
}

/// Hour hand angle, moving continuously through the hour
///
/// Hours are reduced modulo 12, so 0 and 12 coincide.
pub fn hour_angle(hour: u8, minute: u8) -> Angle {
    let minutes = (hour % 12) as u32 * 60 + minute as u32;
    Angle::from_ratio(minutes, 12 * 60)
}

/// The three hand angles for one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandAngles {
    pub second: Angle,
    pub minute: Angle,
    pub hour: Angle,
}

impl HandAngles {
    pub fn from_sample(sample: &TimeSample) -> Self {
        Self {
            second: second_angle(sample.second()),
            minute: minute_angle(sample.minute()),
            hour: hour_angle(sample.hour(), sample.minute()),
        }
    }
}

/// Hand shapes pinned to the face center
#[derive(Debug, Clone)]
pub struct HandGeometry {
    center: Point,
    second_length: i32,
    minute: Path,
    hour: Path,
}

impl HandGeometry {
    /// Pin the hands to the center of `bounds`
    ///
    /// The second hand reaches half the face width.
    pub fn new(bounds: Rect) -> Self {
        let center = bounds.center();
        let mut minute = Path::new(PathInfo::new(&MINUTE_HAND_POINTS));
        let mut hour = Path::new(PathInfo::new(&HOUR_HAND_POINTS));
        minute.move_to(center);
        hour.move_to(center);
        Self {
            center,
            second_length: bounds.size.width as i32 / 2,
            minute,
            hour,
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn second_length(&self) -> i32 {
        self.second_length
    }

    /// Rotate both arrows to the angles for `sample`
    pub fn update(&mut self, sample: &TimeSample) -> HandAngles {
        let angles = HandAngles::from_sample(sample);
        self.minute.rotate_to(angles.minute);
        self.hour.rotate_to(angles.hour);
        angles
    }

    /// Outer end of the second hand at `angle`
    pub fn second_hand_end(&self, angle: Angle) -> Point {
        Point::new(
            angle.sin() * self.second_length / TRIG_MAX_RATIO + self.center.x,
            -angle.cos() * self.second_length / TRIG_MAX_RATIO + self.center.y,
        )
    }

    pub fn minute_points(&self) -> heapless::Vec<Point, MAX_PATH_POINTS> {
        self.minute.points()
    }

    pub fn hour_points(&self) -> heapless::Vec<Point, MAX_PATH_POINTS> {
        self.hour.points()
    }

    /// Draw the hands for `sample`
    ///
    /// Minute arrow first, then hour arrow, then the second hand on top.
    pub fn draw<C: Canvas>(
        &mut self,
        sample: &TimeSample,
        canvas: &mut C,
        second_hand: bool,
    ) -> Result<HandAngles, C::Error> {
        let angles = self.update(sample);

        canvas.fill_polygon(&self.minute_points(), Color::White)?;
        canvas.fill_polygon(&self.hour_points(), Color::White)?;

        if second_hand {
            let end = self.second_hand_end(angles.second);
            canvas.draw_line(end, self.center, Color::White)?;
        }

        Ok(angles)
    }
}
