//! Key/value dictionary codec
//!
//! A dictionary is the payload of a push message: an ordered list of
//! tuples, each a small integer key with a typed value.
//!
//! Layout:
//! - COUNT (1 byte): number of tuples
//! - per tuple: KEY (u32 LE), TYPE (1 byte), LENGTH (u16 LE), VALUE
//!
//! C-strings are stored with their NUL terminator, integers as 1, 2 or 4
//! little-endian bytes.

use crate::result::DictionaryResult;

/// Size of the dictionary header (tuple count)
pub const DICT_HEADER_SIZE: usize = 1;

/// Size of a tuple header (key + type + length)
pub const TUPLE_HEADER_SIZE: usize = 4 + 1 + 2;

/// Maximum number of tuples in one dictionary
pub const MAX_TUPLES: usize = u8::MAX as usize;

/// Encoded size of one tuple holding `value_len` value bytes
pub const fn tuple_size(value_len: usize) -> usize {
    TUPLE_HEADER_SIZE + value_len
}

/// Encoded size of a dictionary whose tuples hold the given value lengths
///
/// Usable in constant context to check buffer capacities at compile time.
pub const fn calc_buffer_size(value_lengths: &[usize]) -> usize {
    let mut total = DICT_HEADER_SIZE;
    let mut i = 0;
    while i < value_lengths.len() {
        total += tuple_size(value_lengths[i]);
        i += 1;
    }
    total
}

/// Value type tag of a tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TupleType {
    ByteArray,
    CString,
    Uint,
    Int,
}

// Wire format values
const TYPE_BYTE_ARRAY: u8 = 0;
const TYPE_CSTRING: u8 = 1;
const TYPE_UINT: u8 = 2;
const TYPE_INT: u8 = 3;

impl TupleType {
    /// Parse a type tag from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            TYPE_BYTE_ARRAY => Some(TupleType::ByteArray),
            TYPE_CSTRING => Some(TupleType::CString),
            TYPE_UINT => Some(TupleType::Uint),
            TYPE_INT => Some(TupleType::Int),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        match self {
            TupleType::ByteArray => TYPE_BYTE_ARRAY,
            TupleType::CString => TYPE_CSTRING,
            TupleType::Uint => TYPE_UINT,
            TupleType::Int => TYPE_INT,
        }
    }
}

/// Storage width of an integer tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntWidth {
    One,
    Two,
    Four,
}

impl IntWidth {
    /// Width in bytes
    pub fn bytes(self) -> usize {
        match self {
            IntWidth::One => 1,
            IntWidth::Two => 2,
            IntWidth::Four => 4,
        }
    }

    fn from_len(len: usize) -> Option<Self> {
        match len {
            1 => Some(IntWidth::One),
            2 => Some(IntWidth::Two),
            4 => Some(IntWidth::Four),
            _ => None,
        }
    }

    fn fits_signed(self, value: i32) -> bool {
        match self {
            IntWidth::One => i8::try_from(value).is_ok(),
            IntWidth::Two => i16::try_from(value).is_ok(),
            IntWidth::Four => true,
        }
    }

    fn fits_unsigned(self, value: u32) -> bool {
        match self {
            IntWidth::One => u8::try_from(value).is_ok(),
            IntWidth::Two => u16::try_from(value).is_ok(),
            IntWidth::Four => true,
        }
    }
}

/// Decoded view of a tuple value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TupleValue<'a> {
    Bytes(&'a [u8]),
    CString(&'a str),
    Uint(u32),
    Int(i32),
}

/// One key/value pair borrowed from an encoded dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tuple<'a> {
    /// Application-defined key
    pub key: u32,
    /// Value type tag
    pub kind: TupleType,
    /// Raw value bytes (C-strings include the terminator)
    pub data: &'a [u8],
}

impl<'a> Tuple<'a> {
    /// Decoded value
    ///
    /// Tuples coming out of [`Dictionary`] were validated when parsed, so
    /// this never falls back to `Bytes` for them.
    pub fn value(&self) -> TupleValue<'a> {
        match self.kind {
            TupleType::CString => match self.as_cstr() {
                Some(s) => TupleValue::CString(s),
                None => TupleValue::Bytes(self.data),
            },
            TupleType::Uint => match self.as_u32() {
                Some(v) => TupleValue::Uint(v),
                None => TupleValue::Bytes(self.data),
            },
            TupleType::Int => match self.as_i32() {
                Some(v) => TupleValue::Int(v),
                None => TupleValue::Bytes(self.data),
            },
            TupleType::ByteArray => TupleValue::Bytes(self.data),
        }
    }

    /// String value without its terminator
    pub fn as_cstr(&self) -> Option<&'a str> {
        if self.kind != TupleType::CString {
            return None;
        }
        let (&last, text) = self.data.split_last()?;
        if last != 0 {
            return None;
        }
        core::str::from_utf8(text).ok()
    }

    /// Signed value, sign-extended from its storage width
    pub fn as_i32(&self) -> Option<i32> {
        match (self.kind, self.data) {
            (TupleType::Int, &[b0]) => Some(b0 as i8 as i32),
            (TupleType::Int, &[b0, b1]) => Some(i16::from_le_bytes([b0, b1]) as i32),
            (TupleType::Int, &[b0, b1, b2, b3]) => Some(i32::from_le_bytes([b0, b1, b2, b3])),
            (TupleType::Uint, _) => self.as_u32().and_then(|v| i32::try_from(v).ok()),
            _ => None,
        }
    }

    /// Unsigned value, zero-extended from its storage width
    pub fn as_u32(&self) -> Option<u32> {
        match (self.kind, self.data) {
            (TupleType::Uint, &[b0]) => Some(b0 as u32),
            (TupleType::Uint, &[b0, b1]) => Some(u16::from_le_bytes([b0, b1]) as u32),
            (TupleType::Uint, &[b0, b1, b2, b3]) => Some(u32::from_le_bytes([b0, b1, b2, b3])),
            (TupleType::Int, _) => self.as_i32().and_then(|v| u32::try_from(v).ok()),
            _ => None,
        }
    }

    /// Raw value bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Encoded size of this tuple
    pub fn encoded_len(&self) -> usize {
        tuple_size(self.data.len())
    }

    /// True if both tuples carry the same type and bytes
    pub fn same_value(&self, other: &Tuple<'_>) -> bool {
        self.kind == other.kind && self.data == other.data
    }
}

/// An owned initial value, used to seed a dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tuplet<'a> {
    pub key: u32,
    pub value: TupleValue<'a>,
}

impl<'a> Tuplet<'a> {
    pub const fn cstring(key: u32, text: &'a str) -> Self {
        Self {
            key,
            value: TupleValue::CString(text),
        }
    }

    pub const fn int(key: u32, value: i32) -> Self {
        Self {
            key,
            value: TupleValue::Int(value),
        }
    }

    pub const fn uint(key: u32, value: u32) -> Self {
        Self {
            key,
            value: TupleValue::Uint(value),
        }
    }

    pub const fn bytes(key: u32, data: &'a [u8]) -> Self {
        Self {
            key,
            value: TupleValue::Bytes(data),
        }
    }

    /// Encoded size of this tuplet (integers are stored 4 bytes wide)
    pub fn encoded_len(&self) -> usize {
        tuple_size(match self.value {
            TupleValue::Bytes(data) => data.len(),
            TupleValue::CString(text) => text.len() + 1,
            TupleValue::Uint(_) | TupleValue::Int(_) => 4,
        })
    }
}

/// Writes tuples into a caller-provided buffer
///
/// Every write is bounds-checked against the buffer; a write that does not
/// fit fails with [`DictionaryResult::NotEnoughStorage`] and leaves the
/// tuples written so far intact.
pub struct DictionaryWriter<'a> {
    buf: &'a mut [u8],
    cursor: usize,
    count: u8,
}

impl<'a> DictionaryWriter<'a> {
    /// Begin a dictionary in `buf`
    pub fn new(buf: &'a mut [u8]) -> Result<Self, DictionaryResult> {
        if buf.len() < DICT_HEADER_SIZE {
            return Err(DictionaryResult::NotEnoughStorage);
        }
        buf[0] = 0;
        Ok(Self {
            buf,
            cursor: DICT_HEADER_SIZE,
            count: 0,
        })
    }

    /// Bytes written so far, header included
    pub fn len(&self) -> usize {
        self.cursor
    }

    /// True if no tuples were written yet
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bytes still available for tuples
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    fn write_raw(
        &mut self,
        key: u32,
        kind: TupleType,
        data: &[u8],
        terminate: bool,
    ) -> Result<(), DictionaryResult> {
        let value_len = data.len() + terminate as usize;
        let wire_len = u16::try_from(value_len).map_err(|_| DictionaryResult::InvalidArgs)?;
        if self.count as usize >= MAX_TUPLES {
            return Err(DictionaryResult::InvalidArgs);
        }
        if tuple_size(value_len) > self.remaining() {
            return Err(DictionaryResult::NotEnoughStorage);
        }

        let start = self.cursor;
        let value_start = start + TUPLE_HEADER_SIZE;
        self.buf[start..start + 4].copy_from_slice(&key.to_le_bytes());
        self.buf[start + 4] = kind.to_byte();
        self.buf[start + 5..value_start].copy_from_slice(&wire_len.to_le_bytes());
        self.buf[value_start..value_start + data.len()].copy_from_slice(data);
        if terminate {
            self.buf[value_start + data.len()] = 0;
        }

        self.cursor = value_start + value_len;
        self.count += 1;
        Ok(())
    }

    /// Write a signed integer stored `width` bytes wide
    pub fn write_int(&mut self, key: u32, value: i32, width: IntWidth) -> Result<(), DictionaryResult> {
        if !width.fits_signed(value) {
            return Err(DictionaryResult::InvalidArgs);
        }
        let bytes = value.to_le_bytes();
        self.write_raw(key, TupleType::Int, &bytes[..width.bytes()], false)
    }

    /// Write an unsigned integer stored `width` bytes wide
    pub fn write_uint(&mut self, key: u32, value: u32, width: IntWidth) -> Result<(), DictionaryResult> {
        if !width.fits_unsigned(value) {
            return Err(DictionaryResult::InvalidArgs);
        }
        let bytes = value.to_le_bytes();
        self.write_raw(key, TupleType::Uint, &bytes[..width.bytes()], false)
    }

    /// Write a NUL-terminated string
    pub fn write_cstring(&mut self, key: u32, text: &str) -> Result<(), DictionaryResult> {
        if text.as_bytes().contains(&0) {
            return Err(DictionaryResult::InvalidArgs);
        }
        self.write_raw(key, TupleType::CString, text.as_bytes(), true)
    }

    /// Write a byte array
    pub fn write_data(&mut self, key: u32, data: &[u8]) -> Result<(), DictionaryResult> {
        self.write_raw(key, TupleType::ByteArray, data, false)
    }

    /// Copy a tuple from another dictionary
    pub fn write_tuple(&mut self, tuple: &Tuple<'_>) -> Result<(), DictionaryResult> {
        self.write_raw(tuple.key, tuple.kind, tuple.data, false)
    }

    /// Write an initial value
    pub fn write_tuplet(&mut self, tuplet: &Tuplet<'_>) -> Result<(), DictionaryResult> {
        match tuplet.value {
            TupleValue::Bytes(data) => self.write_data(tuplet.key, data),
            TupleValue::CString(text) => self.write_cstring(tuplet.key, text),
            TupleValue::Uint(value) => self.write_uint(tuplet.key, value, IntWidth::Four),
            TupleValue::Int(value) => self.write_int(tuplet.key, value, IntWidth::Four),
        }
    }

    /// Finish the dictionary
    ///
    /// Returns the total encoded length.
    pub fn end(self) -> usize {
        self.buf[0] = self.count;
        self.cursor
    }
}

/// A validated, borrowed dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dictionary<'a> {
    bytes: &'a [u8],
    count: u8,
}

impl<'a> Dictionary<'a> {
    /// Validate an encoded dictionary
    ///
    /// The whole buffer is checked up front (bounds, type tags, integer
    /// widths, string terminators and UTF-8), so iteration afterwards
    /// cannot fail. Bytes after the last tuple are ignored.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, DictionaryResult> {
        let (&count, mut rest) = bytes.split_first().ok_or(DictionaryResult::InvalidArgs)?;
        let mut used = DICT_HEADER_SIZE;

        for _ in 0..count {
            let (tuple, len) =
                decode_tuple(rest).ok_or(DictionaryResult::InternalInconsistency)?;
            validate_tuple(&tuple)?;
            rest = &rest[len..];
            used += len;
        }

        Ok(Self {
            bytes: &bytes[..used],
            count,
        })
    }

    /// Number of tuples
    pub fn count(&self) -> usize {
        self.count as usize
    }

    /// Encoded length
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the dictionary holds no tuples
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The encoded bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Iterate tuples in wire order
    pub fn iter(&self) -> TupleIter<'a> {
        TupleIter {
            rest: &self.bytes[DICT_HEADER_SIZE..],
            remaining: self.count,
        }
    }

    /// First tuple with the given key
    pub fn find(&self, key: u32) -> Option<Tuple<'a>> {
        self.iter().find(|t| t.key == key)
    }
}

impl<'a> IntoIterator for &Dictionary<'a> {
    type Item = Tuple<'a>;
    type IntoIter = TupleIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the tuples of a [`Dictionary`]
#[derive(Debug, Clone)]
pub struct TupleIter<'a> {
    rest: &'a [u8],
    remaining: u8,
}

impl<'a> Iterator for TupleIter<'a> {
    type Item = Tuple<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (tuple, len) = decode_tuple(self.rest)?;
        self.rest = &self.rest[len..];
        self.remaining -= 1;
        Some(tuple)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

/// Decode one tuple header and slice its value
///
/// Returns the tuple and its encoded length, or None if the bytes are
/// truncated or the type tag is unknown.
fn decode_tuple(bytes: &[u8]) -> Option<(Tuple<'_>, usize)> {
    let header = bytes.get(..TUPLE_HEADER_SIZE)?;
    let key = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let kind = TupleType::from_byte(header[4])?;
    let value_len = u16::from_le_bytes([header[5], header[6]]) as usize;
    let data = bytes.get(TUPLE_HEADER_SIZE..TUPLE_HEADER_SIZE + value_len)?;
    Some((Tuple { key, kind, data }, tuple_size(value_len)))
}

fn validate_tuple(tuple: &Tuple<'_>) -> Result<(), DictionaryResult> {
    let valid = match tuple.kind {
        TupleType::ByteArray => true,
        TupleType::CString => tuple.as_cstr().is_some(),
        TupleType::Uint | TupleType::Int => IntWidth::from_len(tuple.data.len()).is_some(),
    };
    if valid {
        Ok(())
    } else {
        Err(DictionaryResult::InvalidArgs)
    }
}
