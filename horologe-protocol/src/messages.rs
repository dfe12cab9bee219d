//! App messages carried in link frames
//!
//! Both directions use the same three kinds:
//! - Push: a dictionary for the other side's app
//! - Ack: the push with this transaction id was accepted
//! - Nack: the push was refused, with a reason code

use crate::dict::Dictionary;
use crate::frame::{Frame, FrameError};
use crate::result::{AppMessageResult, DictionaryResult};

// Message kind IDs
pub const MSG_PUSH: u8 = 0x01;
pub const MSG_NACK: u8 = 0x7F;
pub const MSG_ACK: u8 = 0xFF;

/// A decoded app message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppMessage<'a> {
    /// Dictionary payload for the receiving app
    Push { txn: u8, dictionary: &'a [u8] },
    /// Push accepted
    Ack { txn: u8 },
    /// Push refused
    Nack { txn: u8, reason: AppMessageResult },
}

/// Why an incoming frame could not be turned into an app message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// Unknown kind or malformed ack/nack
    Frame(FrameError),
    /// Push payload is not a valid dictionary
    Dictionary(DictionaryResult),
}

impl From<FrameError> for MessageError {
    fn from(e: FrameError) -> Self {
        MessageError::Frame(e)
    }
}

impl From<DictionaryResult> for MessageError {
    fn from(e: DictionaryResult) -> Self {
        MessageError::Dictionary(e)
    }
}

impl<'a> AppMessage<'a> {
    /// Transaction id of this message
    pub fn txn(&self) -> u8 {
        match self {
            AppMessage::Push { txn, .. } | AppMessage::Ack { txn } | AppMessage::Nack { txn, .. } => {
                *txn
            }
        }
    }

    /// Encode this message into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            AppMessage::Push { txn, dictionary } => Frame::new(MSG_PUSH, *txn, dictionary),
            AppMessage::Ack { txn } => Ok(Frame::empty(MSG_ACK, *txn)),
            AppMessage::Nack { txn, reason } => {
                Frame::new(MSG_NACK, *txn, &reason.code().to_le_bytes())
            }
        }
    }

    /// Decode a message from a frame
    ///
    /// Push payloads are validated as dictionaries here so that receivers
    /// only ever see well-formed data.
    pub fn from_frame(frame: &'a Frame) -> Result<Self, MessageError> {
        match frame.kind {
            MSG_PUSH => {
                let dictionary = Dictionary::parse(&frame.payload)?;
                Ok(AppMessage::Push {
                    txn: frame.txn,
                    dictionary: dictionary.as_bytes(),
                })
            }
            MSG_ACK => Ok(AppMessage::Ack { txn: frame.txn }),
            MSG_NACK => match frame.payload.as_slice() {
                &[lo, hi] => Ok(AppMessage::Nack {
                    txn: frame.txn,
                    reason: AppMessageResult::from_code(u16::from_le_bytes([lo, hi])),
                }),
                _ => Err(FrameError::InvalidFrame.into()),
            },
            _ => Err(FrameError::InvalidFrame.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::{DictionaryWriter, IntWidth};

    #[test]
    fn test_push_frame_carries_dictionary() {
        let mut buf = [0u8; 16];
        let mut writer = DictionaryWriter::new(&mut buf).unwrap();
        writer.write_int(1, 1, IntWidth::Four).unwrap();
        let len = writer.end();

        let msg = AppMessage::Push {
            txn: 9,
            dictionary: &buf[..len],
        };
        let frame = msg.to_frame().unwrap();
        assert_eq!(frame.kind, MSG_PUSH);
        assert_eq!(frame.txn, 9);
        assert_eq!(frame.payload.as_slice(), &buf[..len]);
        assert_eq!(AppMessage::from_frame(&frame).unwrap(), msg);
    }

    #[test]
    fn test_push_with_bad_dictionary_is_rejected() {
        let frame = Frame::new(MSG_PUSH, 1, &[2, 1, 0]).unwrap();
        assert_eq!(
            AppMessage::from_frame(&frame),
            Err(MessageError::Dictionary(DictionaryResult::InternalInconsistency))
        );
    }

    #[test]
    fn test_nack_reason_code() {
        let msg = AppMessage::Nack {
            txn: 4,
            reason: AppMessageResult::BufferOverflow,
        };
        let frame = msg.to_frame().unwrap();
        assert_eq!(frame.payload.as_slice(), &128u16.to_le_bytes());
        assert_eq!(AppMessage::from_frame(&frame).unwrap(), msg);
    }

    #[test]
    fn test_short_nack_is_invalid() {
        let frame = Frame::new(MSG_NACK, 4, &[1]).unwrap();
        assert_eq!(
            AppMessage::from_frame(&frame),
            Err(MessageError::Frame(FrameError::InvalidFrame))
        );
    }

    #[test]
    fn test_ack_and_unknown_kind() {
        let ack = Frame::empty(MSG_ACK, 3);
        assert_eq!(AppMessage::from_frame(&ack).unwrap().txn(), 3);

        let unknown = Frame::empty(0x42, 0);
        assert!(AppMessage::from_frame(&unknown).is_err());
    }
}
