//! Wall clock backed by the RP2040 RTC

use core::cell::RefCell;

use defmt::*;
use embassy_rp::peripherals::RTC;
use embassy_rp::rtc::{DateTime, Rtc};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use horologe_core::time::{TimeError, TimeSample, Weekday};
use horologe_core::traits::ClockSource;

/// The RTC, shared by the tick task and the app task
static CLOCK: Mutex<CriticalSectionRawMutex, RefCell<Option<Rtc<'static, RTC>>>> =
    Mutex::new(RefCell::new(None));

/// Hand the running RTC to [`RtcClock`]
pub fn init(rtc: Rtc<'static, RTC>) {
    CLOCK.lock(|cell| *cell.borrow_mut() = Some(rtc));
}

/// Reads local time from the RTC
///
/// Keeps the last good sample and returns it if a read fails.
pub struct RtcClock {
    last: TimeSample,
}

impl RtcClock {
    pub const fn new() -> Self {
        Self {
            last: TimeSample::midnight(),
        }
    }
}

impl ClockSource for RtcClock {
    fn now(&mut self) -> TimeSample {
        let read = CLOCK.lock(|cell| cell.borrow().as_ref().map(|rtc| rtc.now()));

        match read {
            Some(Ok(datetime)) => match to_sample(&datetime) {
                Ok(sample) => self.last = sample,
                Err(e) => warn!("RTC returned an invalid time: {}", e),
            },
            Some(Err(e)) => warn!("RTC read failed: {}", Debug2Format(&e)),
            None => warn!("RTC not initialized"),
        }

        self.last
    }
}

fn to_sample(datetime: &DateTime) -> Result<TimeSample, TimeError> {
    TimeSample::new(
        datetime.hour,
        datetime.minute,
        datetime.second,
        Weekday::from_days_from_sunday(datetime.day_of_week as u8),
        datetime.day,
    )
}
