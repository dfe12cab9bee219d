//! Events delivered to the watch face
//!
//! Every callback source (tick timer, transport) is reduced to one of
//! these and handed to [`super::WatchApp::dispatch`] one at a time.

use heapless::Vec;

use horologe_protocol::{AppMessageResult, MAX_PAYLOAD_SIZE};

use crate::time::TimeSample;

/// Encoded dictionary received from the companion
pub type InboxPayload = Vec<u8, MAX_PAYLOAD_SIZE>;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// One second elapsed; the sample is the time at the tick
    Tick(TimeSample),
    /// The transport finished opening
    TransportOpened,
    /// A push from the companion
    InboxReceived(InboxPayload),
    /// The transport discarded an inbound message
    InboxDropped(AppMessageResult),
    /// The companion acknowledged our last message
    OutboxSent,
    /// Our last message was not delivered
    OutboxFailed(AppMessageResult),
    /// The host asked the face to exit
    Shutdown,
}

/// Whether the event loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Control {
    Continue,
    Exit,
}
