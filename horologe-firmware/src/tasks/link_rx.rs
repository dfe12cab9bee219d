//! Link UART receive task
//!
//! Parses frames from the companion bridge. Pushes become
//! `InboxReceived` events and are acked once queued; acks and nacks for
//! our own push are handed to the TX task.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;
use heapless::Vec;

use horologe_core::app::Event;
use horologe_protocol::messages::MSG_PUSH;
use horologe_protocol::{AppMessage, AppMessageResult, Frame, FrameParser, MessageError};

use crate::channels::{Delivery, DELIVERY, EVENT_CHANNEL, LINK_OPEN, REPLY_CHANNEL};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

#[embassy_executor::task]
pub async fn link_rx_task(mut rx: BufferedUartRx) {
    info!("Link RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => handle_frame(&frame),
                        Ok(None) => {}
                        Err(e) => warn!("Frame parse error: {}", e),
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {}", Debug2Format(&e));
            }
        }
    }
}

fn handle_frame(frame: &Frame) {
    match AppMessage::from_frame(frame) {
        Ok(AppMessage::Push { txn, dictionary }) => handle_push(txn, dictionary),
        Ok(AppMessage::Ack { txn }) => {
            trace!("ACK {}", txn);
            DELIVERY.signal(Delivery::Acked { txn });
        }
        Ok(AppMessage::Nack { txn, reason }) => {
            debug!("NACK {}: {}", txn, reason);
            DELIVERY.signal(Delivery::Rejected { txn, reason });
        }
        Err(MessageError::Dictionary(e)) if frame.kind == MSG_PUSH => {
            warn!("Malformed push {}: {}", frame.txn, e);
            reply(frame.txn, Err(AppMessageResult::InvalidArgs));
            post(Event::InboxDropped(AppMessageResult::InvalidArgs));
        }
        Err(e) => warn!("Bad app message: {}", e),
    }
}

fn handle_push(txn: u8, dictionary: &[u8]) {
    if !LINK_OPEN.load(Ordering::Acquire) {
        debug!("Push {} while closed", txn);
        reply(txn, Err(AppMessageResult::AppNotRunning));
        return;
    }

    // Frame payloads never exceed the inbox payload type
    let Ok(payload) = Vec::from_slice(dictionary) else {
        reply(txn, Err(AppMessageResult::BufferOverflow));
        return;
    };

    if EVENT_CHANNEL.try_send(Event::InboxReceived(payload)).is_ok() {
        reply(txn, Ok(()));
    } else {
        warn!("Event channel full, push {} refused", txn);
        reply(txn, Err(AppMessageResult::Busy));
    }
}

fn post(event: Event) {
    if EVENT_CHANNEL.try_send(event).is_err() {
        warn!("Event channel full, event dropped");
    }
}

fn reply(txn: u8, result: Result<(), AppMessageResult>) {
    let message = match result {
        Ok(()) => AppMessage::Ack { txn },
        Err(reason) => AppMessage::Nack { txn, reason },
    };
    if REPLY_CHANNEL.try_send(message).is_err() {
        warn!("Reply channel full, reply to {} dropped", txn);
    }
}
