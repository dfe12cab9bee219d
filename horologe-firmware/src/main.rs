//! Horologe - analog watch face firmware
//!
//! RP2040 board with a 144x168 Sharp memory LCD and a UART link to the
//! companion bridge. The face, its weather sync and its configuration
//! live in `horologe-core`; this binary wires them to the hardware.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::UART0;
use embassy_rp::rtc::{DateTime, DayOfWeek, Rtc};
use embassy_rp::spi::{Config as SpiConfig, Spi};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use horologe_core::config::{parse_config, WatchConfig};
use horologe_display::MemoryLcd;

/// Embedded configuration (compiled into firmware)
/// Edit watch.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../watch.toml");

/// Memory LCD SPI clock
const LCD_SPI_HZ: u32 = 1_000_000;

mod channels;
mod clock;
mod tasks;
mod transport;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// UART buffers hold at least one full link frame
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Horologe firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    // RTC keeps running across resets; only seed it when stopped
    let mut rtc = Rtc::new(p.RTC);
    if !rtc.is_running() {
        let epoch = DateTime {
            year: 2024,
            month: 1,
            day: 1,
            day_of_week: DayOfWeek::Monday,
            hour: 0,
            minute: 0,
            second: 0,
        };
        if let Err(e) = rtc.set_datetime(epoch) {
            warn!("RTC seed failed: {}", Debug2Format(&e));
        }
    }
    clock::init(rtc);
    info!("RTC initialized");

    // Companion link on UART0 (GPIO0 TX, GPIO1 RX), 115200 baud
    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 512]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    info!("UART initialized for the companion link");

    // Memory LCD on SPI0 (GPIO18 SCK, GPIO19 MOSI, GPIO17 CS), DISP on GPIO20
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = LCD_SPI_HZ;
    let spi = Spi::new_txonly(p.SPI0, p.PIN_18, p.PIN_19, p.DMA_CH0, spi_config);
    let cs = Output::new(p.PIN_17, Level::Low);
    let disp = Output::new(p.PIN_20, Level::High);
    // DISP must stay driven high for the panel to show anything
    core::mem::forget(disp);
    let lcd = MemoryLcd::new(spi, cs);
    info!("LCD initialized");

    spawner.spawn(tasks::link_rx_task(rx)).unwrap();
    spawner.spawn(tasks::link_tx_task(tx)).unwrap();
    spawner.spawn(tasks::app_task(config, lcd)).unwrap();
    spawner.spawn(tasks::tick_task()).unwrap();

    info!("All tasks spawned, firmware running");
}

/// Parse the embedded watch.toml, falling back to defaults
fn load_config() -> WatchConfig {
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse embedded config: {}", e);
            return WatchConfig::default();
        }
    };

    match config.validate() {
        Ok(()) => {
            info!(
                "Configuration loaded: tick unit {}, inbox {}, outbox {}",
                config.tick_unit, config.inbox_size, config.outbox_size
            );
            config
        }
        Err(e) => {
            warn!("Embedded config rejected: {}, using defaults", e);
            WatchConfig::default()
        }
    }
}
