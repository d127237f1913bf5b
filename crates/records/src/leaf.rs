//! Leaf records: the 20-byte value descriptors the tree's nodes point at.

use crate::{RecordError, HEADER_SIZE, LEAF_SIZE};
use blockio::BlockFile;
use codec::{ByteReader, ByteWriter};

/// Points at a value's raw bytes, appended to the file before the leaf.
///
/// `version` is the committing transaction's operation counter at write time.
/// `value_len == 0` marks a tombstone: the key is logically deleted and
/// lookups treat it as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
    pub version: u64,
    pub value_len: u32,
    pub value_pos: i64,
}

impl Leaf {
    /// Reads the leaf record at `pos`.
    pub fn load(file: &BlockFile, pos: i64) -> Result<Self, RecordError> {
        if pos < HEADER_SIZE as i64 {
            return Err(RecordError::Corrupt("leaf position out of range"));
        }
        let mut buf = [0u8; LEAF_SIZE];
        file.read_at(pos as u64, &mut buf)?;
        let mut r = ByteReader::new(&buf);
        Ok(Self {
            version: r.get_u64()?,
            value_len: r.get_u32()?,
            value_pos: r.get_i64()?,
        })
    }

    /// Appends the leaf record and returns its offset.
    pub fn dump(&self, file: &BlockFile) -> Result<i64, RecordError> {
        let mut buf = [0u8; LEAF_SIZE];
        let mut w = ByteWriter::new(&mut buf);
        w.put_u64(self.version)?;
        w.put_u32(self.value_len)?;
        w.put_i64(self.value_pos)?;
        let pos = file.append(&buf)?;
        Ok(pos as i64)
    }

    /// Whether this leaf marks a deletion.
    pub fn is_tombstone(&self) -> bool {
        self.value_len == 0
    }
}
