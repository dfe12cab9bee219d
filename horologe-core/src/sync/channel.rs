//! Sync channel
//!
//! Wraps a [`Transport`] with the request/reply state machine. The channel
//! never retries on its own; every failure is handed back to the owner.

use horologe_protocol::{calc_buffer_size, AppMessageResult, DictionaryResult, DictionaryWriter, IntWidth};

use super::events::ChannelEvent;
use super::keys::{SyncKey, REQUEST_VALUE};
use super::machine::{ChannelState, SyncFailure};
use crate::traits::Transport;

/// Smallest outbox a channel may be opened with
pub const MIN_OUTBOX_SIZE: usize = 16;

/// Encoded size of a refresh request: one 4-byte integer tuple
pub const REQUEST_MESSAGE_SIZE: usize = calc_buffer_size(&[4]);

const _: () = assert!(REQUEST_MESSAGE_SIZE <= MIN_OUTBOX_SIZE);

/// Why a request was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestError {
    /// Channel is closed, still opening, or holding an unacknowledged error
    NotOpen,
    /// A request is already outstanding
    Busy,
    /// The transport had no outbox buffer
    NoBuffer,
    /// The request did not fit the outbox
    Encode(DictionaryResult),
    /// The transport refused the send
    Send(AppMessageResult),
}

/// Request/reply channel to the companion app
#[derive(Debug)]
pub struct SyncChannel<T: Transport> {
    transport: T,
    state: ChannelState,
}

impl<T: Transport> SyncChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ChannelState::Closed,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn apply(&mut self, event: ChannelEvent) {
        let next = self.state.transition(event);
        if next != self.state {
            debug!("sync channel: {} -> {}", self.state, next);
        } else {
            trace!("sync channel: {} ignored in {}", event, self.state);
        }
        self.state = next;
    }

    /// Ask the transport to open with the given buffer sizes
    ///
    /// Only valid from `Closed`. Completion arrives via [`on_opened`](Self::on_opened).
    pub fn open(&mut self, inbox_size: usize, outbox_size: usize) -> Result<(), AppMessageResult> {
        if self.state != ChannelState::Closed {
            return Err(AppMessageResult::InvalidArgs);
        }
        self.transport.open(inbox_size, outbox_size)?;
        self.apply(ChannelEvent::OpenRequested);
        Ok(())
    }

    /// Transport reported the channel ready
    pub fn on_opened(&mut self) {
        self.apply(ChannelEvent::Opened);
    }

    /// Ask the companion to refresh `key`
    ///
    /// Writes `{key: Int32(1)}` into the transport's outbox and sends it.
    /// If the message cannot be built or sent, nothing is sent and the
    /// state is left as it was.
    pub fn request(&mut self, key: SyncKey) -> Result<(), RequestError> {
        match self.state {
            ChannelState::RequestSent => return Err(RequestError::Busy),
            state if !state.accepts_request() => return Err(RequestError::NotOpen),
            _ => {}
        }

        let encoded = match self.transport.outbox_begin() {
            Some(buf) => encode_request(buf, key),
            None => {
                warn!("sync channel: no outbox buffer, request for {} dropped", key);
                return Err(RequestError::NoBuffer);
            }
        };

        let len = match encoded {
            Ok(len) => len,
            Err(e) => {
                warn!("sync channel: request encode failed: {}", e);
                self.transport.release_outbox();
                return Err(RequestError::Encode(e));
            }
        };

        if let Err(e) = self.transport.outbox_send(len) {
            warn!("sync channel: send refused: {}", e);
            return Err(RequestError::Send(e));
        }

        self.apply(ChannelEvent::RequestQueued);
        Ok(())
    }

    /// A dictionary from the companion was merged into the cache
    pub fn on_reply(&mut self) {
        self.apply(ChannelEvent::ReplyReceived);
    }

    /// The transport confirmed delivery of the last request
    ///
    /// The request stays outstanding until the reply arrives.
    pub fn on_sent(&mut self) {
        trace!("sync channel: request delivered");
    }

    /// Send failure, rejected channel or undecodable payload
    pub fn on_failure(&mut self, failure: SyncFailure) {
        warn!("sync channel: failure {}", failure);
        self.apply(ChannelEvent::Failed(failure));
    }

    /// Leave `Error` for `Idle`, returning the failure that was held
    pub fn acknowledge_error(&mut self) -> Option<SyncFailure> {
        match self.state {
            ChannelState::Error(failure) => {
                self.apply(ChannelEvent::AcknowledgeError);
                Some(failure)
            }
            _ => None,
        }
    }

    /// Close the transport
    pub fn close(&mut self) {
        if self.state != ChannelState::Closed {
            self.transport.close();
            self.apply(ChannelEvent::TransportClosed);
        }
    }

    /// Close and give back the transport
    pub fn into_transport(mut self) -> T {
        self.close();
        self.transport
    }
}

/// Encode a refresh request for `key` into `buf`
pub fn encode_request(buf: &mut [u8], key: SyncKey) -> Result<usize, DictionaryResult> {
    let mut writer = DictionaryWriter::new(buf)?;
    writer.write_int(key.raw(), REQUEST_VALUE, IntWidth::Four)?;
    Ok(writer.end())
}
