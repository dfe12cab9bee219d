//! App message transport trait
//!
//! Outbound messages are built in place: the transport lends its outbox
//! buffer, the caller writes a dictionary into it, then hands back the
//! encoded length. Completion and failure arrive later as events.

use horologe_protocol::AppMessageResult;

pub trait Transport {
    /// Start opening the channel with the given buffer sizes
    ///
    /// Returns once the request is accepted; readiness is reported
    /// asynchronously.
    fn open(&mut self, inbox_size: usize, outbox_size: usize) -> Result<(), AppMessageResult>;

    /// Borrow the outbox buffer for a new message
    ///
    /// `None` when no buffer is available (a send is still in flight or the
    /// channel is not open).
    fn outbox_begin(&mut self) -> Option<&mut [u8]>;

    /// Send the first `len` bytes of the outbox
    fn outbox_send(&mut self, len: usize) -> Result<(), AppMessageResult>;

    /// Give back an outbox taken with `outbox_begin` without sending
    fn release_outbox(&mut self) {}

    /// Close the channel
    fn close(&mut self) {}
}
