//! Inter-task communication channels
//!
//! Every input to the watch face goes through [`EVENT_CHANNEL`], which
//! only the app task receives from, so events are handled one at a time.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use heapless::Vec;
use portable_atomic::AtomicBool;

use horologe_core::app::Event;
use horologe_protocol::{AppMessage, AppMessageResult, MAX_PAYLOAD_SIZE};

/// Channel capacity for app events
const EVENT_CHANNEL_SIZE: usize = 8;

/// Channel capacity for link replies (acks and nacks we owe the companion)
const REPLY_CHANNEL_SIZE: usize = 4;

/// Encoded dictionary waiting to be pushed to the companion
pub type OutboxMessage = Vec<u8, MAX_PAYLOAD_SIZE>;

/// What the companion said about our last push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Delivery {
    Acked { txn: u8 },
    Rejected { txn: u8, reason: AppMessageResult },
}

/// Events for the watch face, consumed only by the app task
pub static EVENT_CHANNEL: Channel<CriticalSectionRawMutex, Event, EVENT_CHANNEL_SIZE> =
    Channel::new();

/// Outbound push; one at a time
pub static OUTBOX_CHANNEL: Channel<CriticalSectionRawMutex, OutboxMessage, 1> = Channel::new();

/// Acks and nacks for pushes received from the companion
pub static REPLY_CHANNEL: Channel<CriticalSectionRawMutex, AppMessage<'static>, REPLY_CHANNEL_SIZE> =
    Channel::new();

/// Ack or nack for our outstanding push (set by link RX, awaited by link TX)
pub static DELIVERY: Signal<CriticalSectionRawMutex, Delivery> = Signal::new();

/// True from the moment a push is queued until its delivery is settled
pub static OUTBOX_BUSY: AtomicBool = AtomicBool::new(false);

/// True while the transport is open; pushes are refused otherwise
pub static LINK_OPEN: AtomicBool = AtomicBool::new(false);
