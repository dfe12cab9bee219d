//! Sync channel state machine
//!
//! ```text
//! Closed -> OpenPending -> Open -> RequestSent -> Idle
//!                                       |          ^
//!                                       v          |
//!                                     Error --------
//! ```
//!
//! Nothing here retries. Leaving `Error` takes an explicit acknowledgement,
//! and a new request from `Idle` re-enters `RequestSent`. Failures before
//! the transport reports ready leave the channel in `OpenPending`, so
//! `Error` and `Idle` are only reached from an opened channel.

use horologe_protocol::{AppMessageResult, DictionaryResult};

use super::events::ChannelEvent;

/// The failure code delivered to the error path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncFailure {
    /// An inbound dictionary could not be decoded or merged
    Dictionary(DictionaryResult),
    /// The transport could not deliver or accept a message
    AppMessage(AppMessageResult),
}

impl From<DictionaryResult> for SyncFailure {
    fn from(e: DictionaryResult) -> Self {
        SyncFailure::Dictionary(e)
    }
}

impl From<AppMessageResult> for SyncFailure {
    fn from(e: AppMessageResult) -> Self {
        SyncFailure::AppMessage(e)
    }
}

/// Channel states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// Transport not opened
    Closed,
    /// Open requested, waiting for the transport
    OpenPending,
    /// Transport ready, nothing requested yet
    Open,
    /// A request is outstanding
    RequestSent,
    /// Ready, last exchange finished
    Idle,
    /// Last exchange failed
    Error(SyncFailure),
}

impl ChannelState {
    /// Whether a new request may be built in this state
    pub fn accepts_request(&self) -> bool {
        matches!(self, ChannelState::Open | ChannelState::Idle)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ChannelState::Error(_))
    }

    /// Whether the transport has finished opening
    pub fn is_open(&self) -> bool {
        !matches!(self, ChannelState::Closed | ChannelState::OpenPending)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: ChannelEvent) -> Self {
        use ChannelEvent::*;
        use ChannelState::*;

        match (self, event) {
            (Closed, OpenRequested) => OpenPending,

            (OpenPending, Opened) => Open,

            (Open, RequestQueued) => RequestSent,
            (Open, ReplyReceived) => Idle,
            (Open, Failed(failure)) => Error(failure),

            (RequestSent, ReplyReceived) => Idle,
            (RequestSent, Failed(failure)) => Error(failure),

            (Idle, RequestQueued) => RequestSent,
            (Idle, ReplyReceived) => Idle,
            (Idle, Failed(failure)) => Error(failure),

            (Error(_), AcknowledgeError) => Idle,

            (_, TransportClosed) => Closed,

            // Default: stay in current state
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: SyncFailure = SyncFailure::AppMessage(AppMessageResult::SendTimeout);

    #[test]
    fn test_happy_path() {
        let state = ChannelState::Closed
            .transition(ChannelEvent::OpenRequested)
            .transition(ChannelEvent::Opened);
        assert_eq!(state, ChannelState::Open);
        let state = state.transition(ChannelEvent::RequestQueued);
        assert_eq!(state, ChannelState::RequestSent);
        assert_eq!(state.transition(ChannelEvent::ReplyReceived), ChannelState::Idle);
    }

    #[test]
    fn test_failure_from_active_states() {
        let states = [
            ChannelState::Open,
            ChannelState::RequestSent,
            ChannelState::Idle,
        ];
        for state in states {
            assert_eq!(
                state.transition(ChannelEvent::Failed(TIMEOUT)),
                ChannelState::Error(TIMEOUT)
            );
        }
    }

    #[test]
    fn test_error_needs_acknowledgement() {
        let state = ChannelState::Error(TIMEOUT);
        assert_eq!(state.transition(ChannelEvent::RequestQueued), state);
        assert_eq!(state.transition(ChannelEvent::ReplyReceived), state);
        assert_eq!(state.transition(ChannelEvent::AcknowledgeError), ChannelState::Idle);
    }

    #[test]
    fn test_request_only_when_ready() {
        assert_eq!(
            ChannelState::Closed.transition(ChannelEvent::RequestQueued),
            ChannelState::Closed
        );
        assert_eq!(
            ChannelState::RequestSent.transition(ChannelEvent::RequestQueued),
            ChannelState::RequestSent
        );
        assert!(ChannelState::Idle.accepts_request());
        assert!(!ChannelState::RequestSent.accepts_request());
        assert!(!ChannelState::Error(TIMEOUT).accepts_request());
    }

    #[test]
    fn test_failure_before_open_keeps_waiting() {
        let state = ChannelState::OpenPending.transition(ChannelEvent::Failed(TIMEOUT));
        assert_eq!(state, ChannelState::OpenPending);
        assert!(!state.is_open());
        assert!(!state.accepts_request());
        assert_eq!(state.transition(ChannelEvent::AcknowledgeError), ChannelState::OpenPending);
        assert_eq!(state.transition(ChannelEvent::Opened), ChannelState::Open);
    }

    #[test]
    fn test_closed_failure_is_ignored() {
        assert_eq!(
            ChannelState::Closed.transition(ChannelEvent::Failed(TIMEOUT)),
            ChannelState::Closed
        );
    }

    #[test]
    fn test_close_from_anywhere() {
        for state in [ChannelState::Open, ChannelState::Idle, ChannelState::Error(TIMEOUT)] {
            assert_eq!(state.transition(ChannelEvent::TransportClosed), ChannelState::Closed);
        }
    }
}
