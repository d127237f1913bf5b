//! # Records — on-disk record layouts
//!
//! Binary layouts and load/dump routines for every record in the database
//! file. All integers are little-endian; all fields are fixed-width.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ HEADER (128 bytes at offset 0)                                │
//! │                                                               │
//! │ magic "ctdb" (4) | version (u32) | zero padding               │
//! ├───────────────────────────────────────────────────────────────┤
//! │ APPENDED RECORDS (any order, never rewritten)                 │
//! │                                                               │
//! │ value blob   raw bytes, length known to its leaf              │
//! │ leaf (20)    version (u64) | value_len (u32) | value_pos (i64)│
//! │ node (74+9C) prefix_len (u8) | prefix (64) | leaf_pos (i64)   │
//! │              | items_count C (u8)                             │
//! │              then C items: first_byte (u8) | child_pos (i64)  │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER (40 bytes, at a 32-byte-aligned offset)                │
//! │                                                               │
//! │ cksum (u64) | tran_count (u64) | del_count (u64)              │
//! │ | root_pos (i64) | cksum again (u64)                          │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! A footer atomically publishes a tree root: it is self-checksummed, written
//! strictly at or after the data tail, and discovered by scanning backwards
//! over the aligned slots. Everything before it is immutable, so a torn
//! footer write can only lose the newest commit, never corrupt an older one.
//!
//! Offsets on disk are `i64` with `0` meaning "none" (no leaf at a node, no
//! root in an empty database). Valid record offsets are always at or past
//! [`HEADER_SIZE`], so `0` never collides with real data.

mod footer;
mod leaf;
mod node;

pub use footer::{align_up, Footer};
pub use leaf::Leaf;
pub use node::{Item, Node};

use blockio::BlockFile;
use codec::{ByteReader, ByteWriter, CodecError};
use std::io;
use thiserror::Error;

/// Header region size; the first appended record starts here.
pub const HEADER_SIZE: u64 = 128;
/// File magic, first four header bytes.
pub const MAGIC: &[u8; 4] = b"ctdb";
/// Format version stored in the header.
pub const VERSION: u32 = 1;

/// Maximum key length in bytes; node prefixes are padded to this.
pub const KEY_MAX: usize = 64;
/// Maximum value length in bytes (1 GiB).
pub const VALUE_MAX: u32 = 1 << 30;
/// Size of the alphabet a child-item table indexes over.
pub const MAX_CHILDREN: usize = 256;

/// Fixed part of a node record: prefix_len + prefix + leaf_pos + items_count.
pub const NODE_FIXED: usize = 1 + KEY_MAX + 8 + 1;
/// One child-item entry: first_byte + child_pos.
pub const ITEM_SIZE: usize = 9;
/// Leaf record: version + value_len + value_pos.
pub const LEAF_SIZE: usize = 20;
/// Footer record size.
pub const FOOTER_SIZE: usize = 40;
/// Footer slots sit at multiples of this.
pub const ALIGN: u64 = 32;

/// Errors from record serialization and deserialization.
#[derive(Debug, Error)]
pub enum RecordError {
    /// An underlying read/write/seek/sync failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A record did not fit its buffer (layout bug, not disk state).
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// On-disk bytes inconsistent with the format.
    #[error("corrupt record: {0}")]
    Corrupt(&'static str),
}

type Result<T> = std::result::Result<T, RecordError>;

/// Writes the 128-byte header at offset 0. Called once at file creation.
pub fn write_header(file: &BlockFile) -> Result<()> {
    let mut buf = [0u8; HEADER_SIZE as usize];
    let mut w = ByteWriter::new(&mut buf);
    w.put_bytes(MAGIC)?;
    w.put_u32(VERSION)?;
    file.write_at(0, &buf)?;
    Ok(())
}

/// Reads the header back and verifies magic and version.
pub fn check_header(file: &BlockFile) -> Result<()> {
    let mut buf = [0u8; HEADER_SIZE as usize];
    file.read_at(0, &mut buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            RecordError::Corrupt("file shorter than header")
        } else {
            RecordError::Io(e)
        }
    })?;
    let mut r = ByteReader::new(&buf);
    let magic = r.get_slice(MAGIC.len())?;
    let version = r.get_u32()?;
    if magic != MAGIC {
        return Err(RecordError::Corrupt("bad magic"));
    }
    if version != VERSION {
        return Err(RecordError::Corrupt("unsupported version"));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
