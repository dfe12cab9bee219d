//! Value sync with the companion app
//!
//! - [`SyncCache`]: last known value per key, merged from inbound dictionaries
//! - [`SyncChannel`]: request/reply state machine over a transport
//! - [`SyncKey`]: the keys this face tracks

pub mod cache;
pub mod channel;
pub mod events;
pub mod keys;
pub mod machine;

pub use cache::{SyncCache, TupleChange};
pub use channel::{encode_request, RequestError, SyncChannel, MIN_OUTBOX_SIZE, REQUEST_MESSAGE_SIZE};
pub use events::ChannelEvent;
pub use keys::{SyncKey, REQUEST_VALUE, WEATHER_TEMPERATURE_KEY};
pub use machine::{ChannelState, SyncFailure};

/// Bytes reserved for the cached dictionary
pub const SYNC_BUFFER_SIZE: usize = 64;
