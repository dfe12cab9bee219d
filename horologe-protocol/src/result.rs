//! Result codes shared by the dictionary codec and the app message transport
//!
//! The numeric codes are stable and travel in NACK payloads, so both sides
//! of the link agree on them.

/// Dictionary encode/decode failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DictionaryResult {
    /// The buffer cannot hold the data to be written
    NotEnoughStorage,
    /// A tuple or argument is malformed
    InvalidArgs,
    /// The dictionary contradicts itself (count vs. content)
    InternalInconsistency,
}

impl DictionaryResult {
    /// Wire code for this result
    pub fn code(self) -> u8 {
        match self {
            DictionaryResult::NotEnoughStorage => 2,
            DictionaryResult::InvalidArgs => 4,
            DictionaryResult::InternalInconsistency => 8,
        }
    }
}

/// App message transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppMessageResult {
    /// The other side did not acknowledge in time
    SendTimeout,
    /// The other side refused the message (NACK)
    SendRejected,
    /// No companion is connected
    NotConnected,
    /// The companion side app is not running
    AppNotRunning,
    /// Bad arguments to a transport call
    InvalidArgs,
    /// An outbound message is still pending
    Busy,
    /// The message does not fit the inbox or outbox
    BufferOverflow,
    /// The transport has not been opened or was closed
    Closed,
    /// Anything else
    InternalError,
}

impl AppMessageResult {
    /// Wire code for this result
    pub fn code(self) -> u16 {
        match self {
            AppMessageResult::SendTimeout => 2,
            AppMessageResult::SendRejected => 4,
            AppMessageResult::NotConnected => 8,
            AppMessageResult::AppNotRunning => 16,
            AppMessageResult::InvalidArgs => 32,
            AppMessageResult::Busy => 64,
            AppMessageResult::BufferOverflow => 128,
            AppMessageResult::Closed => 8192,
            AppMessageResult::InternalError => 16384,
        }
    }

    /// Parse a wire code, mapping unknown values to `InternalError`
    pub fn from_code(code: u16) -> Self {
        match code {
            2 => AppMessageResult::SendTimeout,
            4 => AppMessageResult::SendRejected,
            8 => AppMessageResult::NotConnected,
            16 => AppMessageResult::AppNotRunning,
            32 => AppMessageResult::InvalidArgs,
            64 => AppMessageResult::Busy,
            128 => AppMessageResult::BufferOverflow,
            8192 => AppMessageResult::Closed,
            _ => AppMessageResult::InternalError,
        }
    }
}
