//! Date text for the labels under the dial

use core::fmt::Write;

use heapless::String;

use crate::time::TimeSample;

/// Capacity of the day-of-week label
pub const DAY_TEXT_LEN: usize = 3;

/// Capacity of the day-of-month label
pub const NUM_TEXT_LEN: usize = 2;

/// Formatted day labels for one sample
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateText {
    /// Three-letter weekday, e.g. "Sun"
    pub day: String<DAY_TEXT_LEN>,
    /// Zero-padded day of month, e.g. "05"
    pub num: String<NUM_TEXT_LEN>,
}

impl DateText {
    /// Format both labels from `sample`
    ///
    /// Weekday abbreviations are exactly three bytes and days of month at
    /// most two digits, so the buffers never truncate.
    pub fn format(sample: &TimeSample) -> Self {
        let mut text = Self::default();
        text.update(sample);
        text
    }

    /// Reformat in place
    pub fn update(&mut self, sample: &TimeSample) {
        self.day.clear();
        let _ = self.day.push_str(sample.weekday().abbrev());

        self.num.clear();
        let _ = write!(self.num, "{:02}", sample.day());
    }
}
