//! App task
//!
//! Owns the watch face, the frame buffer and the LCD. Events are taken
//! from [`EVENT_CHANNEL`] one at a time; after each one the changed rows
//! go to the panel.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Async, Spi};

use horologe_core::app::{Control, WatchApp};
use horologe_core::config::WatchConfig;
use horologe_display::{EgCanvas, FrameBuffer, MemoryLcd};

use crate::channels::EVENT_CHANNEL;
use crate::clock::RtcClock;
use crate::transport::LinkTransport;

/// The panel on SPI0 with a GPIO chip select
pub type Lcd = MemoryLcd<Spi<'static, SPI0, Async>, Output<'static>>;

#[embassy_executor::task]
pub async fn app_task(config: WatchConfig, mut lcd: Lcd) {
    info!("App task started");

    let mut app = match WatchApp::on_create(config, LinkTransport::new(), RtcClock::new()) {
        Ok(app) => app,
        Err(e) => {
            error!("Watch face rejected its configuration: {}", e);
            return;
        }
    };

    if let Err(e) = lcd.clear().await {
        warn!("LCD clear failed: {}", e);
    }

    let mut frame = FrameBuffer::new();

    loop {
        let event = EVENT_CHANNEL.receive().await;
        let control = app.dispatch(event, &mut EgCanvas::new(&mut frame));

        match lcd.flush(&mut frame).await {
            // Nothing changed; VCOM still has to alternate
            Ok(0) => {
                if let Err(e) = lcd.refresh_vcom().await {
                    warn!("VCOM refresh failed: {}", e);
                }
            }
            Ok(rows) => trace!("Flushed {} rows", rows),
            Err(e) => warn!("LCD flush failed: {}", e),
        }

        if control == Control::Exit {
            break;
        }
    }

    let diagnostics = app.diagnostics();
    let _transport = app.on_destroy();
    info!(
        "Watch face exited: {} frames, {} sync failures, {} aborted requests",
        diagnostics.frames, diagnostics.sync_failures, diagnostics.aborted_requests
    );
}
