//! Field-level binary codec.
//!
//! CCP does not use a single byte order: some multi-byte fields are Intel
//! (little-endian) and others Motorola (big-endian), depending on the command.
//! Every multi-byte field the crate reads or writes is a named [`Field`] in
//! [`fields`], so the byte order of each one is stated exactly once.
//!
//! | Field | Encoding |
//! |---|---|
//! | SET_MTA address | little-endian 32-bit |
//! | GET_DAQ_SIZE / WRITE_DAQ address | big-endian 32-bit |
//! | START_STOP rate prescaler | big-endian 16-bit |
//! | CONNECT / DISCONNECT / TEST station address | little-endian 16-bit |
//! | BUILD_CHKSUM block size | little-endian 32-bit |
//! | SHORT_UP address, CLEAR_MEMORY / MOVE size | big-endian 32-bit |
//! | MTA address in responses | big-endian 32-bit |

use bytes::{Buf, BufMut};

use crate::constants::MAX_PAYLOAD_SIZE;
use crate::error::ProtocolError;

/// Byte order of a multi-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Intel byte order.
    Little,
    /// Motorola byte order.
    Big,
}

/// Width of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// One byte.
    U8,
    /// Two bytes.
    U16,
    /// Four bytes.
    U32,
}

impl Width {
    /// Number of bytes occupied on the wire.
    pub const fn size(self) -> usize {
        match self {
            Width::U8 => 1,
            Width::U16 => 2,
            Width::U32 => 4,
        }
    }

    /// Largest value the width can hold.
    pub const fn max_value(self) -> u32 {
        match self {
            Width::U8 => u8::MAX as u32,
            Width::U16 => u16::MAX as u32,
            Width::U32 => u32::MAX,
        }
    }
}

/// A named, fixed-width, fixed-order integer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Name used in error messages.
    pub name: &'static str,
    /// Width on the wire.
    pub width: Width,
    /// Byte order on the wire.
    pub order: ByteOrder,
}

impl Field {
    /// A single-byte field.
    pub const fn u8(name: &'static str) -> Self {
        Field { name, width: Width::U8, order: ByteOrder::Little }
    }

    /// A little-endian 16-bit field.
    pub const fn u16_le(name: &'static str) -> Self {
        Field { name, width: Width::U16, order: ByteOrder::Little }
    }

    /// A big-endian 16-bit field.
    pub const fn u16_be(name: &'static str) -> Self {
        Field { name, width: Width::U16, order: ByteOrder::Big }
    }

    /// A little-endian 32-bit field.
    pub const fn u32_le(name: &'static str) -> Self {
        Field { name, width: Width::U32, order: ByteOrder::Little }
    }

    /// A big-endian 32-bit field.
    pub const fn u32_be(name: &'static str) -> Self {
        Field { name, width: Width::U32, order: ByteOrder::Big }
    }

    /// Number of bytes this field occupies.
    pub const fn size(&self) -> usize {
        self.width.size()
    }

    /// Append `value` to `buf`.
    ///
    /// Fails if `value` does not fit the field's width.
    pub fn put<B: BufMut>(&self, buf: &mut B, value: u32) -> Result<(), ProtocolError> {
        if value > self.width.max_value() {
            return Err(ProtocolError::InvalidArgument {
                command: self.name,
                reason: format!("value 0x{:X} does not fit in {} bytes", value, self.size()),
            });
        }
        match (self.width, self.order) {
            (Width::U8, _) => buf.put_u8(value as u8),
            (Width::U16, ByteOrder::Little) => buf.put_u16_le(value as u16),
            (Width::U16, ByteOrder::Big) => buf.put_u16(value as u16),
            (Width::U32, ByteOrder::Little) => buf.put_u32_le(value),
            (Width::U32, ByteOrder::Big) => buf.put_u32(value),
        }
        Ok(())
    }

    /// Read this field from the front of `buf`, or `None` if it is too short.
    pub fn get<B: Buf>(&self, buf: &mut B) -> Option<u32> {
        if buf.remaining() < self.size() {
            return None;
        }
        Some(match (self.width, self.order) {
            (Width::U8, _) => buf.get_u8() as u32,
            (Width::U16, ByteOrder::Little) => buf.get_u16_le() as u32,
            (Width::U16, ByteOrder::Big) => buf.get_u16() as u32,
            (Width::U32, ByteOrder::Little) => buf.get_u32_le(),
            (Width::U32, ByteOrder::Big) => buf.get_u32(),
        })
    }
}

/// Every multi-byte field of the command set.
pub mod fields {
    use super::Field;

    /// CONNECT / DISCONNECT / TEST station address.
    pub const STATION_ADDRESS: Field = Field::u16_le("station address");
    /// SET_MTA memory address.
    pub const SET_MTA_ADDRESS: Field = Field::u32_le("SET_MTA address");
    /// GET_DAQ_SIZE DTO identifier.
    pub const DAQ_SIZE_ADDRESS: Field = Field::u32_be("GET_DAQ_SIZE address");
    /// WRITE_DAQ element address.
    pub const WRITE_DAQ_ADDRESS: Field = Field::u32_be("WRITE_DAQ address");
    /// START_STOP transmission rate prescaler.
    pub const RATE_PRESCALER: Field = Field::u16_be("START_STOP prescaler");
    /// BUILD_CHKSUM block size.
    pub const CHECKSUM_BLOCK_SIZE: Field = Field::u32_le("BUILD_CHKSUM block size");
    /// SHORT_UP source address.
    pub const SHORT_UP_ADDRESS: Field = Field::u32_be("SHORT_UP address");
    /// CLEAR_MEMORY block size.
    pub const CLEAR_MEMORY_SIZE: Field = Field::u32_be("CLEAR_MEMORY size");
    /// MOVE block size.
    pub const MOVE_SIZE: Field = Field::u32_be("MOVE size");
    /// MTA address reported by DNLOAD / PROGRAM / GET_ACTIVE_CAL_PAGE.
    pub const RESPONSE_MTA_ADDRESS: Field = Field::u32_be("MTA address");
}

/// Builder for a command payload that enforces the 6-byte limit.
#[derive(Debug, Default, Clone)]
pub struct PayloadWriter {
    buf: Vec<u8>,
}

impl PayloadWriter {
    /// Create an empty payload.
    pub fn new() -> Self {
        PayloadWriter {
            buf: Vec::with_capacity(MAX_PAYLOAD_SIZE),
        }
    }

    /// Append a single byte.
    pub fn u8(mut self, value: u8) -> Self {
        self.buf.put_u8(value);
        self
    }

    /// Append a field.
    pub fn field(mut self, field: Field, value: u32) -> Result<Self, ProtocolError> {
        field.put(&mut self.buf, value)?;
        Ok(self)
    }

    /// Append raw bytes.
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.buf.extend_from_slice(data);
        self
    }

    /// Finish the payload, failing if it no longer fits in a frame.
    pub fn finish(self) -> Result<Vec<u8>, ProtocolError> {
        if self.buf.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                max: MAX_PAYLOAD_SIZE,
                actual: self.buf.len(),
            });
        }
        Ok(self.buf)
    }
}
