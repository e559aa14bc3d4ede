//! Versioned binary container for a whole chain.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! header:  container_id u64 || format_version u64 || block_count u64
//! name:    len u64 || utf-8 bytes
//! block*:  id u32 || prev_id u32 || timestamp u64
//!          || prev_hash || owner || nonce || data || sig.hash || sig.signature
//!          (each byte string: len u64 || bytes)
//! ```
//!
//! There is no checksum beyond the signatures embedded in each block. The
//! decoder yields blocks one at a time so the caller can validate each record
//! against what it has already accepted.

use bytes::Bytes;

use blocko_core::{Block, BlockSignature};

use crate::codec::{Field, Reader, Writer};
use crate::error::CodecError;

/// Magic number identifying a BlockO container.
pub const CONTAINER_ID: u64 = 3_489_030_000;

/// Newest format version this codec reads and the one it writes.
pub const FORMAT_VERSION: u64 = 100;

/// Encoded header width.
pub const HEADER_LEN: usize = 24;

/// Container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub container_id: u64,
    pub format_version: u64,
    /// Number of block records the writer declared.
    pub block_count: u64,
}

impl ContainerHeader {
    /// Header for a container written by this codec.
    pub fn new(block_count: u64) -> Self {
        Self {
            container_id: CONTAINER_ID,
            format_version: FORMAT_VERSION,
            block_count,
        }
    }

    /// Reject foreign or newer containers.
    pub fn check(&self) -> Result<(), CodecError> {
        if self.container_id != CONTAINER_ID {
            return Err(CodecError::BadMagic {
                expected: CONTAINER_ID,
                found: self.container_id,
            });
        }
        if self.format_version > FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion {
                found: self.format_version,
                supported: FORMAT_VERSION,
            });
        }
        Ok(())
    }
}

impl Field for ContainerHeader {
    fn encode(&self, writer: &mut Writer) {
        writer.put_u64(self.container_id);
        writer.put_u64(self.format_version);
        writer.put_u64(self.block_count);
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            container_id: reader.get_u64()?,
            format_version: reader.get_u64()?,
            block_count: reader.get_u64()?,
        })
    }
}

impl Field for Block {
    fn encode(&self, writer: &mut Writer) {
        writer.put_u32(self.id);
        writer.put_u32(self.prev_id);
        writer.put_u64(self.timestamp);
        writer.put_bytes(&self.prev_hash);
        writer.put_bytes(&self.owner);
        writer.put_bytes(&self.nonce);
        writer.put_bytes(&self.data);
        writer.put_bytes(&self.signature.hash);
        writer.put_bytes(&self.signature.signature);
    }

    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let id = reader.get_u32()?;
        let prev_id = reader.get_u32()?;
        let timestamp = reader.get_u64()?;
        let prev_hash = reader.get_bytes()?;
        let owner = reader.get_bytes()?;
        let nonce = reader.get_bytes()?;
        let data = reader.get_bytes()?;
        let hash = reader.get_bytes()?;
        let signature = reader.get_bytes()?;

        Ok(Block {
            id,
            prev_id,
            timestamp,
            nonce,
            prev_hash,
            owner,
            data,
            signature: BlockSignature { hash, signature },
        })
    }
}

/// Encoded size of one block record.
pub fn block_record_len(block: &Block) -> usize {
    4 + 4 + 8
        + 6 * 8
        + block.prev_hash.len()
        + block.owner.len()
        + block.nonce.len()
        + block.data.len()
        + block.signature.hash.len()
        + block.signature.signature.len()
}

/// Serialize a chain into a single buffer.
pub fn encode_container(name: &str, blocks: &[Block]) -> Bytes {
    let capacity =
        HEADER_LEN + 8 + name.len() + blocks.iter().map(block_record_len).sum::<usize>();
    let mut writer = Writer::with_capacity(capacity);

    writer.put(&ContainerHeader::new(blocks.len() as u64));
    writer.put_bytes(name.as_bytes());
    for block in blocks {
        writer.put(block);
    }

    writer.finish()
}

/// Streaming decoder over a container buffer.
///
/// [`ContainerDecoder::open`] reads and checks the header and the chain
/// name; header problems are fatal. Iterating then yields one decoded record
/// per declared block. The first record error ends iteration.
#[derive(Debug)]
pub struct ContainerDecoder<'a> {
    reader: Reader<'a>,
    header: ContainerHeader,
    name: String,
    decoded: u64,
    failed: bool,
}

impl<'a> ContainerDecoder<'a> {
    /// Read the header and the chain name.
    pub fn open(data: &'a [u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(data);
        let header: ContainerHeader = reader.get()?;
        header.check()?;
        let name: String = reader.get()?;

        Ok(Self {
            reader,
            header,
            name,
            decoded: 0,
            failed: false,
        })
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records decoded so far.
    pub fn decoded(&self) -> u64 {
        self.decoded
    }

    /// Bytes not consumed by the records read so far.
    pub fn trailing_bytes(&self) -> usize {
        self.reader.remaining()
    }
}

impl Iterator for ContainerDecoder<'_> {
    type Item = Result<Block, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.decoded >= self.header.block_count {
            return None;
        }

        match self.reader.get::<Block>() {
            Ok(block) => {
                self.decoded += 1;
                Some(Ok(block))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
