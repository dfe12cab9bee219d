//! Screen geometry for the analog face
//!
//! Everything is integer math on top of [`crate::trig`], so a given time
//! always produces the same pixels.

pub mod hands;
pub mod path;
pub mod point;
pub mod ticks;

pub use hands::{HandAngles, HandGeometry, HOUR_HAND_POINTS, MINUTE_HAND_POINTS};
pub use path::{Path, PathInfo, MAX_PATH_POINTS};
pub use point::{Point, Rect, Size};
pub use ticks::{TickMarks, NUM_CLOCK_TICKS};
