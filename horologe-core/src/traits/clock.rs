//! Wall-clock source

use crate::time::TimeSample;

/// Reads the current local time
pub trait ClockSource {
    fn now(&mut self) -> TimeSample;
}

/// A clock that always reads the same instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub TimeSample);

impl ClockSource for FixedClock {
    fn now(&mut self) -> TimeSample {
        self.0
    }
}
