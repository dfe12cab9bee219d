//! Tick task
//!
//! Samples the RTC once a second and posts the sample to the app.

use defmt::*;
use embassy_time::{Duration, Ticker};

use horologe_core::app::Event;
use horologe_core::traits::ClockSource;

use crate::channels::EVENT_CHANNEL;
use crate::clock::RtcClock;

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u64 = 1000;

#[embassy_executor::task]
pub async fn tick_task() {
    info!("Tick task started");

    let mut clock = RtcClock::new();
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    loop {
        ticker.next().await;

        let sample = clock.now();
        // Never block the ticker on a full channel
        if EVENT_CHANNEL.try_send(Event::Tick(sample)).is_err() {
            warn!("Event channel full, tick dropped");
        }
    }
}
