//! Wall-clock samples
//!
//! A [`TimeSample`] is taken fresh from the clock for every redraw and
//! never stored beyond it.

/// Errors from building a time sample out of raw fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeError {
    HourOutOfRange,
    MinuteOutOfRange,
    SecondOutOfRange,
    DayOutOfRange,
}

/// Day of the week
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// Three-letter English abbreviation
    pub fn abbrev(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sun",
            Weekday::Monday => "Mon",
            Weekday::Tuesday => "Tue",
            Weekday::Wednesday => "Wed",
            Weekday::Thursday => "Thu",
            Weekday::Friday => "Fri",
            Weekday::Saturday => "Sat",
        }
    }

    /// Days since Sunday (0-6)
    pub fn days_from_sunday(self) -> u8 {
        self as u8
    }

    /// Build from days since Sunday, wrapping past Saturday
    pub fn from_days_from_sunday(days: u8) -> Self {
        match days % 7 {
            0 => Weekday::Sunday,
            1 => Weekday::Monday,
            2 => Weekday::Tuesday,
            3 => Weekday::Wednesday,
            4 => Weekday::Thursday,
            5 => Weekday::Friday,
            _ => Weekday::Saturday,
        }
    }
}

/// Which fields differ between two samples
///
/// A tick subscription delivers these alongside the sample so handlers can
/// skip work when only the second moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeUnits(u8);

impl TimeUnits {
    pub const NONE: TimeUnits = TimeUnits(0);
    pub const SECOND: TimeUnits = TimeUnits(1 << 0);
    pub const MINUTE: TimeUnits = TimeUnits(1 << 1);
    pub const HOUR: TimeUnits = TimeUnits(1 << 2);
    pub const DAY: TimeUnits = TimeUnits(1 << 3);
    pub const ALL: TimeUnits = TimeUnits(0b1111);

    /// True if any unit in `other` is set in `self`
    pub fn intersects(self, other: TimeUnits) -> bool {
        self.0 & other.0 != 0
    }

    /// True if every unit in `other` is set in `self`
    pub fn contains(self, other: TimeUnits) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl core::ops::BitOr for TimeUnits {
    type Output = TimeUnits;

    fn bitor(self, rhs: TimeUnits) -> TimeUnits {
        TimeUnits(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for TimeUnits {
    fn bitor_assign(&mut self, rhs: TimeUnits) {
        self.0 |= rhs.0;
    }
}

/// One reading of the local wall clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeSample {
    hour: u8,
    minute: u8,
    second: u8,
    weekday: Weekday,
    day: u8,
}

impl TimeSample {
    /// Build a sample, checking every field's range
    ///
    /// - `hour`: 0-23
    /// - `minute`, `second`: 0-59
    /// - `day`: day of month, 1-31
    pub fn new(
        hour: u8,
        minute: u8,
        second: u8,
        weekday: Weekday,
        day: u8,
    ) -> Result<Self, TimeError> {
        if hour > 23 {
            return Err(TimeError::HourOutOfRange);
        }
        if minute > 59 {
            return Err(TimeError::MinuteOutOfRange);
        }
        if second > 59 {
            return Err(TimeError::SecondOutOfRange);
        }
        if !(1..=31).contains(&day) {
            return Err(TimeError::DayOutOfRange);
        }
        Ok(Self {
            hour,
            minute,
            second,
            weekday,
            day,
        })
    }

    /// Midnight on Sunday the 1st, for clocks that have not been set
    pub const fn midnight() -> Self {
        Self {
            hour: 0,
            minute: 0,
            second: 0,
            weekday: Weekday::Sunday,
            day: 1,
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    /// Day of month (1-31)
    pub fn day(&self) -> u8 {
        self.day
    }

    /// Minutes elapsed on a 12-hour dial (0-719)
    pub fn minutes_of_half_day(&self) -> u32 {
        (self.hour % 12) as u32 * 60 + self.minute as u32
    }

    /// Units that differ from `previous`
    ///
    /// A change in a coarse unit implies the finer ones, matching how a
    /// tick service reports rollovers.
    pub fn changed_units(&self, previous: &TimeSample) -> TimeUnits {
        let mut units = TimeUnits::NONE;
        if self.day != previous.day || self.weekday != previous.weekday {
            units |= TimeUnits::DAY;
        }
        if units.intersects(TimeUnits::DAY) || self.hour != previous.hour {
            units |= TimeUnits::HOUR;
        }
        if units.intersects(TimeUnits::HOUR) || self.minute != previous.minute {
            units |= TimeUnits::MINUTE;
        }
        if units.intersects(TimeUnits::MINUTE) || self.second != previous.second {
            units |= TimeUnits::SECOND;
        }
        units
    }
}
