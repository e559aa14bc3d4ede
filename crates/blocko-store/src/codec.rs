//! Fixed-width binary field codec.
//!
//! [`Writer`] is an append-only byte builder and [`Reader`] is a cursor over
//! an immutable buffer. Both speak the [`Field`] trait:
//!
//! - `u32`, `u64`: little-endian, fixed width
//! - byte strings: `u64` length prefix followed by the raw bytes
//!
//! Every read is bounds-checked. A short read is [`CodecError::Truncated`],
//! never a panic.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::CodecError;

/// A value with a fixed binary encoding.
pub trait Field: Sized {
    fn encode(&self, writer: &mut Writer);
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError>;
}

/// Append-only byte builder.
#[derive(Debug, Default)]
pub struct Writer {
    buf: BytesMut,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn put_u64(&mut self, value: u64) {
        self.buf.put_u64_le(value);
    }

    /// Write a length-prefixed byte string.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_u64(bytes.len() as u64);
        self.buf.put_slice(bytes);
    }

    pub fn put<F: Field>(&mut self, field: &F) {
        field.encode(self);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Freeze the buffer.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Bounds-checked cursor over a byte buffer.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take exactly `len` raw bytes.
    pub fn take(&mut self, len: u64) -> Result<&'a [u8], CodecError> {
        let truncated = CodecError::Truncated {
            offset: self.pos,
            needed: len,
            remaining: self.remaining(),
        };
        let len = usize::try_from(len).map_err(|_| truncated.clone())?;
        if len > self.remaining() {
            return Err(truncated);
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn get_u32(&mut self) -> Result<u32, CodecError> {
        let mut arr = [0u8; 4];
        arr.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(arr))
    }

    pub fn get_u64(&mut self) -> Result<u64, CodecError> {
        let mut arr = [0u8; 8];
        arr.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(arr))
    }

    /// Read a length-prefixed byte string.
    pub fn get_bytes(&mut self) -> Result<Bytes, CodecError> {
        let len = self.get_u64()?;
        Ok(Bytes::copy_from_slice(self.take(len)?))
    }

    pub fn get<F: Field>(&mut self) -> Result<F, CodecError> {
        F::decode(self)
    }
}

impl Field for u32 {
    fn encode(&self, writer: &mut Writer) {
        writer.put_u32(*self);
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        reader.get_u32()
    }
}

impl Field for u64 {
    fn encode(&self, writer: &mut Writer) {
        writer.put_u64(*self);
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        reader.get_u64()
    }
}

impl Field for Bytes {
    fn encode(&self, writer: &mut Writer) {
        writer.put_bytes(self);
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        reader.get_bytes()
    }
}

impl Field for String {
    fn encode(&self, writer: &mut Writer) {
        writer.put_bytes(self.as_bytes());
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let bytes = reader.get_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidName)
    }
}
