//! Link UART transmit task
//!
//! Sends acks/nacks for companion pushes and our own outbound push.
//! After a push it waits for the companion's ack; no answer within
//! [`ACK_TIMEOUT_MS`] fails the send with `SendTimeout`.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_futures::select::{select, select3, Either, Either3};
use embassy_rp::uart::BufferedUartTx;
use embassy_time::{Duration, Instant, Timer};
use embedded_io_async::Write;

use horologe_core::app::Event;
use horologe_protocol::{AppMessage, AppMessageResult};

use crate::channels::{
    Delivery, OutboxMessage, DELIVERY, EVENT_CHANNEL, OUTBOX_BUSY, OUTBOX_CHANNEL, REPLY_CHANNEL,
};

/// How long the companion has to acknowledge a push
pub const ACK_TIMEOUT_MS: u64 = 3000;

#[embassy_executor::task]
pub async fn link_tx_task(mut tx: BufferedUartTx) {
    info!("Link TX task started");

    let mut next_txn: u8 = 0;

    loop {
        match select(REPLY_CHANNEL.receive(), OUTBOX_CHANNEL.receive()).await {
            Either::First(reply) => {
                if let Err(e) = send_message(&mut tx, &reply).await {
                    warn!("Failed to send reply: {}", e);
                }
            }
            Either::Second(message) => {
                let txn = next_txn;
                next_txn = next_txn.wrapping_add(1);

                let outcome = push(&mut tx, txn, &message).await;
                OUTBOX_BUSY.store(false, Ordering::Release);
                EVENT_CHANNEL.send(outcome).await;
            }
        }
    }
}

/// Send one push and wait for its delivery report
async fn push(tx: &mut BufferedUartTx, txn: u8, message: &OutboxMessage) -> Event {
    // Anything signalled before now belongs to an earlier push
    DELIVERY.reset();

    let push = AppMessage::Push {
        txn,
        dictionary: message,
    };
    if let Err(e) = send_message(tx, &push).await {
        warn!("Failed to send push {}: {}", txn, e);
        return Event::OutboxFailed(e);
    }
    debug!("Push {} sent, {} bytes", txn, message.len());

    let deadline = Instant::now() + Duration::from_millis(ACK_TIMEOUT_MS);
    loop {
        match select3(Timer::at(deadline), DELIVERY.wait(), REPLY_CHANNEL.receive()).await {
            Either3::First(()) => {
                warn!("Push {} timed out", txn);
                return Event::OutboxFailed(AppMessageResult::SendTimeout);
            }
            Either3::Second(Delivery::Acked { txn: acked }) if acked == txn => {
                return Event::OutboxSent;
            }
            Either3::Second(Delivery::Rejected { txn: rejected, reason }) if rejected == txn => {
                return Event::OutboxFailed(reason);
            }
            Either3::Second(stale) => debug!("Ignoring stale delivery {}", stale),
            // Keep answering the companion while we wait
            Either3::Third(reply) => {
                if let Err(e) = send_message(tx, &reply).await {
                    warn!("Failed to send reply: {}", e);
                }
            }
        }
    }
}

async fn send_message(tx: &mut BufferedUartTx, message: &AppMessage<'_>) -> Result<(), AppMessageResult> {
    let frame = message
        .to_frame()
        .map_err(|_| AppMessageResult::BufferOverflow)?;
    let bytes = frame
        .encode_to_vec()
        .map_err(|_| AppMessageResult::BufferOverflow)?;

    tx.write_all(&bytes).await.map_err(|e| {
        warn!("UART write error: {}", Debug2Format(&e));
        AppMessageResult::NotConnected
    })?;
    trace!("TX: {} bytes", bytes.len());
    Ok(())
}
