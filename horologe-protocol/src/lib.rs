//! Companion link protocol
//!
//! This crate defines the wire formats used between the watch and the
//! companion bridge (phone side). It has three layers:
//!
//! - [`frame`]: link framing over a byte stream (UART/BLE serial)
//! - [`messages`]: app messages carried in frames (push, ack, nack)
//! - [`dict`]: the key/value dictionary carried by a push
//!
//! # Frame Overview
//!
//! ```text
//! ┌───────┬──────┬─────┬──────────┬─────────────┬───────┐
//! │ START │ TYPE │ TXN │ LENGTH   │ PAYLOAD     │ CRC-8 │
//! │ 1B    │ 1B   │ 1B  │ 2B (LE)  │ 0–256B      │ 1B    │
//! └───────┴──────┴─────┴──────────┴─────────────┴───────┘
//! ```
//!
//! # Dictionary Overview
//!
//! ```text
//! ┌───────┬────────────────────────────────────────────┐
//! │ COUNT │ TUPLE × COUNT                              │
//! │ 1B    │ KEY (4B LE) TYPE (1B) LEN (2B LE) VALUE    │
//! └───────┴────────────────────────────────────────────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod dict;
pub mod frame;
pub mod messages;
pub mod result;

pub use dict::{
    calc_buffer_size, tuple_size, Dictionary, DictionaryWriter, IntWidth, Tuple, TupleType,
    TupleValue, Tuplet,
};
pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_PAYLOAD_SIZE};
pub use messages::{AppMessage, MessageError};
pub use result::{AppMessageResult, DictionaryResult};
