//! `Transport` over the UART link tasks
//!
//! The app task owns the outbox buffer. A send copies the message into
//! [`OUTBOX_CHANNEL`]; the TX task frames it and reports the outcome as
//! `OutboxSent` or `OutboxFailed`. Only one push is in flight at a time.

use core::sync::atomic::Ordering;

use defmt::*;
use heapless::Vec;

use horologe_core::app::Event;
use horologe_core::traits::Transport;
use horologe_protocol::{AppMessageResult, MAX_PAYLOAD_SIZE};

use crate::channels::{EVENT_CHANNEL, LINK_OPEN, OUTBOX_BUSY, OUTBOX_CHANNEL};

pub struct LinkTransport {
    outbox: [u8; MAX_PAYLOAD_SIZE],
    outbox_size: usize,
    open: bool,
}

impl LinkTransport {
    pub const fn new() -> Self {
        Self {
            outbox: [0; MAX_PAYLOAD_SIZE],
            outbox_size: 0,
            open: false,
        }
    }
}

impl Transport for LinkTransport {
    fn open(&mut self, inbox_size: usize, outbox_size: usize) -> Result<(), AppMessageResult> {
        if inbox_size > MAX_PAYLOAD_SIZE || outbox_size > MAX_PAYLOAD_SIZE {
            return Err(AppMessageResult::BufferOverflow);
        }

        self.outbox_size = outbox_size;
        self.open = true;
        LINK_OPEN.store(true, Ordering::Release);
        info!("Link open: inbox {} outbox {}", inbox_size, outbox_size);

        // The UART is already up, so readiness follows immediately
        EVENT_CHANNEL
            .try_send(Event::TransportOpened)
            .map_err(|_| AppMessageResult::Busy)
    }

    fn outbox_begin(&mut self) -> Option<&mut [u8]> {
        if !self.open || OUTBOX_BUSY.load(Ordering::Acquire) {
            return None;
        }
        Some(&mut self.outbox[..self.outbox_size])
    }

    fn outbox_send(&mut self, len: usize) -> Result<(), AppMessageResult> {
        if !self.open {
            return Err(AppMessageResult::Closed);
        }
        if len > self.outbox_size {
            return Err(AppMessageResult::BufferOverflow);
        }
        if OUTBOX_BUSY.swap(true, Ordering::AcqRel) {
            return Err(AppMessageResult::Busy);
        }

        let message = Vec::from_slice(&self.outbox[..len]).map_err(|_| AppMessageResult::BufferOverflow);
        let queued = message.and_then(|message| {
            OUTBOX_CHANNEL
                .try_send(message)
                .map_err(|_| AppMessageResult::Busy)
        });

        if queued.is_err() {
            OUTBOX_BUSY.store(false, Ordering::Release);
        }
        queued
    }

    fn close(&mut self) {
        self.open = false;
        LINK_OPEN.store(false, Ordering::Release);
        info!("Link closed");
    }
}
