//! Redraw scheduling
//!
//! The tick source fires once per wall-clock second. The scheduler decides
//! which ticks repaint the face at the configured granularity, and lets
//! non-tick causes (a new temperature) force the next repaint.

use crate::time::{TimeSample, TimeUnits};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Finest unit the face reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TickUnit {
    /// Repaint every second, second hand drawn
    #[default]
    Second,
    /// Repaint on minute change only, second hand hidden
    Minute,
}

impl TickUnit {
    /// Units whose change triggers a repaint
    pub fn trigger(self) -> TimeUnits {
        match self {
            TickUnit::Second => TimeUnits::SECOND,
            TickUnit::Minute => TimeUnits::MINUTE,
        }
    }
}

/// Decides when the surface must be redrawn
#[derive(Debug, Clone)]
pub struct RedrawScheduler {
    unit: TickUnit,
    last: Option<TimeSample>,
    dirty: bool,
}

impl RedrawScheduler {
    /// New scheduler; the first tick always redraws
    pub fn new(unit: TickUnit) -> Self {
        Self {
            unit,
            last: None,
            dirty: true,
        }
    }

    pub fn unit(&self) -> TickUnit {
        self.unit
    }

    /// Whether the second hand belongs on the face at this granularity
    pub fn shows_second_hand(&self) -> bool {
        self.unit == TickUnit::Second
    }

    /// Mark the surface dirty for a reason other than time
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record a tick; returns true if the face should be redrawn now
    ///
    /// Clears the dirty flag when it answers yes.
    pub fn on_tick(&mut self, sample: &TimeSample) -> bool {
        let changed = match &self.last {
            Some(previous) => sample.changed_units(previous),
            None => TimeUnits::ALL,
        };
        self.last = Some(*sample);

        let due = match self.unit {
            // A tick is a second, even when the clock reads the same
            TickUnit::Second => true,
            TickUnit::Minute => changed.intersects(self.unit.trigger()),
        };

        if due || self.dirty {
            self.dirty = false;
            true
        } else {
            false
        }
    }

    /// Take a pending invalidation outside of a tick
    ///
    /// Returns true once per [`invalidate`](Self::invalidate).
    pub fn take_invalidation(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }

    /// Last sample seen by [`on_tick`](Self::on_tick)
    pub fn last_sample(&self) -> Option<&TimeSample> {
        self.last.as_ref()
    }
}
