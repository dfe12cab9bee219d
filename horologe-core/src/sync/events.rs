//! Events that drive the sync channel state machine

use super::machine::SyncFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelEvent {
    /// Transport open was started
    OpenRequested,
    /// Transport reported it is ready
    Opened,
    /// A request message was handed to the transport
    RequestQueued,
    /// A dictionary from the companion was merged
    ReplyReceived,
    /// Send failure, rejected channel or undecodable payload
    Failed(SyncFailure),
    /// The owner has seen the error
    AcknowledgeError,
    /// Transport was closed
    TransportClosed,
}
