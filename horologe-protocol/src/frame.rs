//! Frame encoding and decoding for the companion link.
//!
//! Frame format:
//! - START (1 byte): 0x55 synchronization byte
//! - TYPE (1 byte): app message kind
//! - TXN (1 byte): transaction id, echoed by acks
//! - LENGTH (2 bytes, little endian): payload length (0-256)
//! - PAYLOAD (0-256 bytes): kind-specific data
//! - CRC (1 byte): CRC-8 (poly 0x07, init 0x00) over TYPE, TXN, LENGTH and PAYLOAD

use heapless::Vec;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0x55;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 256;

/// Bytes surrounding the payload (START + TYPE + TXN + LENGTH + CRC)
pub const FRAME_OVERHEAD: usize = 1 + 1 + 1 + 2 + 1;

/// Maximum complete frame size
pub const MAX_FRAME_SIZE: usize = FRAME_OVERHEAD + MAX_PAYLOAD_SIZE;

const CRC8_POLY: u8 = 0x07;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Checksum mismatch
    InvalidChecksum,
    /// Invalid frame structure
    InvalidFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Feed one byte into a running CRC-8
fn crc8_update(mut crc: u8, byte: u8) -> u8 {
    crc ^= byte;
    for _ in 0..8 {
        crc = if crc & 0x80 != 0 {
            (crc << 1) ^ CRC8_POLY
        } else {
            crc << 1
        };
    }
    crc
}

/// CRC-8 over a byte slice
pub fn crc8(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |crc, &b| crc8_update(crc, b))
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// App message kind
    pub kind: u8,
    /// Transaction id
    pub txn: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given kind, transaction id and payload
    pub fn new(kind: u8, txn: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { kind, txn, payload })
    }

    /// Create a frame with no payload
    pub fn empty(kind: u8, txn: u8) -> Self {
        Self {
            kind,
            txn,
            payload: Vec::new(),
        }
    }

    /// Total encoded length of this frame
    pub fn encoded_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    fn header(&self) -> [u8; 4] {
        let len = (self.payload.len() as u16).to_le_bytes();
        [self.kind, self.txn, len[0], len[1]]
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let header = self.header();
        let body_end = 1 + header.len() + self.payload.len();

        buffer[0] = FRAME_START;
        buffer[1..5].copy_from_slice(&header);
        buffer[5..body_end].copy_from_slice(&self.payload);
        buffer[body_end] = crc8(&buffer[1..body_end]);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}

/// Streaming frame parser
///
/// Bytes are fed one at a time as they arrive from the link. Garbage
/// between frames is skipped until the next START byte.
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    kind: u8,
    txn: u8,
    expected_length: u16,
    crc: u8,
    buffer: Vec<u8, MAX_PAYLOAD_SIZE>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    WaitingForStart,
    WaitingForKind,
    WaitingForTxn,
    WaitingForLengthLow,
    WaitingForLengthHigh,
    ReadingPayload,
    WaitingForCrc,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForStart,
            kind: 0,
            txn: 0,
            expected_length: 0,
            crc: 0,
            buffer: Vec::new(),
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.kind = 0;
        self.txn = 0;
        self.expected_length = 0;
        self.crc = 0;
        self.buffer.clear();
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        if !matches!(
            self.state,
            ParseState::WaitingForStart | ParseState::WaitingForCrc
        ) {
            self.crc = crc8_update(self.crc, byte);
        }

        match self.state {
            ParseState::WaitingForStart => {
                if byte == FRAME_START {
                    self.crc = 0;
                    self.state = ParseState::WaitingForKind;
                }
                Ok(None)
            }
            ParseState::WaitingForKind => {
                self.kind = byte;
                self.state = ParseState::WaitingForTxn;
                Ok(None)
            }
            ParseState::WaitingForTxn => {
                self.txn = byte;
                self.state = ParseState::WaitingForLengthLow;
                Ok(None)
            }
            ParseState::WaitingForLengthLow => {
                self.expected_length = byte as u16;
                self.state = ParseState::WaitingForLengthHigh;
                Ok(None)
            }
            ParseState::WaitingForLengthHigh => {
                self.expected_length |= (byte as u16) << 8;
                if self.expected_length as usize > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(FrameError::InvalidFrame);
                }
                self.buffer.clear();
                self.state = if self.expected_length == 0 {
                    ParseState::WaitingForCrc
                } else {
                    ParseState::ReadingPayload
                };
                Ok(None)
            }
            ParseState::ReadingPayload => {
                // Length was bounds-checked above
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.expected_length as usize {
                    self.state = ParseState::WaitingForCrc;
                }
                Ok(None)
            }
            ParseState::WaitingForCrc => {
                if byte != self.crc {
                    self.reset();
                    return Err(FrameError::InvalidChecksum);
                }

                let frame = Frame {
                    kind: self.kind,
                    txn: self.txn,
                    payload: core::mem::take(&mut self.buffer),
                };

                self.reset();
                Ok(Some(frame))
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found and the number of bytes
    /// consumed. Bytes after a complete frame are left for the next call.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<(Option<Frame>, usize), FrameError> {
        for (i, &byte) in bytes.iter().enumerate() {
            if let Some(frame) = self.feed(byte)? {
                return Ok((Some(frame), i + 1));
            }
        }
        Ok((None, bytes.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc8_check_value() {
        // CRC-8/SMBUS check value
        assert_eq!(crc8(b"123456789"), 0xF4);
    }

    #[test]
    fn test_frame_encode_empty_payload() {
        let frame = Frame::empty(0xFF, 7);
        let mut buffer = [0u8; 10];
        let len = frame.encode(&mut buffer).unwrap();

        assert_eq!(len, FRAME_OVERHEAD);
        assert_eq!(buffer[0], FRAME_START);
        assert_eq!(buffer[1], 0xFF);
        assert_eq!(buffer[2], 7);
        assert_eq!(&buffer[3..5], &[0, 0]);
        assert_eq!(buffer[5], crc8(&[0xFF, 7, 0, 0]));
    }

    #[test]
    fn test_frame_length_is_little_endian() {
        let payload = [0xAB; MAX_PAYLOAD_SIZE];
        let frame = Frame::new(0x01, 0, &payload).unwrap();
        let encoded = frame.encode_to_vec().unwrap();
        assert_eq!(encoded[3], 0x00);
        assert_eq!(encoded[4], 0x01);
    }

    #[test]
    fn test_frame_parse_after_encode() {
        let original = Frame::new(0x01, 42, &[1, 2, 3, 4, 5]).unwrap();
        let encoded = original.encode_to_vec().unwrap();

        let mut parser = FrameParser::new();
        let (parsed, used) = parser.feed_bytes(&encoded).unwrap();

        assert_eq!(parsed, Some(original));
        assert_eq!(used, encoded.len());
    }

    #[test]
    fn test_parser_invalid_checksum() {
        let frame = Frame::new(0x01, 1, &[9, 9]).unwrap();
        let mut encoded = frame.encode_to_vec().unwrap();
        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;

        let mut parser = FrameParser::new();
        assert_eq!(parser.feed_bytes(&encoded), Err(FrameError::InvalidChecksum));
    }

    #[test]
    fn test_parser_rejects_oversized_length() {
        let mut parser = FrameParser::new();
        let header = [FRAME_START, 0x01, 0x00, 0x01, 0x02]; // 513 bytes
        assert_eq!(parser.feed_bytes(&header), Err(FrameError::InvalidFrame));
    }

    #[test]
    fn test_parser_resync_after_garbage() {
        let frame = Frame::empty(0x7F, 3);
        let encoded = frame.encode_to_vec().unwrap();

        let mut data = Vec::<u8, 20>::new();
        data.extend_from_slice(&[0x00, 0xFF, 0x12, 0x34]).unwrap();
        data.extend_from_slice(&encoded).unwrap();

        let mut parser = FrameParser::new();
        let (parsed, _) = parser.feed_bytes(&data).unwrap();

        assert_eq!(parsed.map(|f| (f.kind, f.txn)), Some((0x7F, 3)));
    }

    #[test]
    fn test_back_to_back_frames() {
        let a = Frame::new(0x01, 1, b"a").unwrap().encode_to_vec().unwrap();
        let b = Frame::empty(0xFF, 2).encode_to_vec().unwrap();
        let mut data = Vec::<u8, 32>::new();
        data.extend_from_slice(&a).unwrap();
        data.extend_from_slice(&b).unwrap();

        let mut parser = FrameParser::new();
        let (first, used) = parser.feed_bytes(&data).unwrap();
        assert_eq!(first.unwrap().txn, 1);
        let (second, _) = parser.feed_bytes(&data[used..]).unwrap();
        assert_eq!(second.unwrap().txn, 2);
    }

    #[test]
    fn test_payload_too_large() {
        let large_payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        assert_eq!(
            Frame::new(0x01, 0, &large_payload),
            Err(FrameError::PayloadTooLarge)
        );
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let frame = Frame::new(0x01, 0, &[1, 2, 3]).unwrap();
        let mut buffer = [0u8; 8];
        assert_eq!(frame.encode(&mut buffer), Err(FrameError::BufferTooSmall));
    }
}
