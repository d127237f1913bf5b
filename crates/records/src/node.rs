//! Radix-tree node records.

use crate::{RecordError, HEADER_SIZE, ITEM_SIZE, KEY_MAX, MAX_CHILDREN, NODE_FIXED};
use blockio::BlockFile;
use codec::{ByteReader, ByteWriter};

/// Largest possible node frame: fixed part plus a full item table. The
/// on-disk count field is a `u8`, so at most 255 items fit.
const NODE_MAX_BYTES: usize = NODE_FIXED + (MAX_CHILDREN - 1) * ITEM_SIZE;

/// One child edge: the first byte of the child's prefix and the child node's
/// file offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub first_byte: u8,
    pub child_pos: i64,
}

/// An in-memory copy of a node record.
///
/// Nodes on disk are immutable; mutating this copy and dumping it appends a
/// fresh record and yields a new offset. `items` is kept sorted ascending by
/// `first_byte` with no duplicates; [`Node::dump`] writes it in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub prefix_len: u8,
    pub prefix: [u8; KEY_MAX],
    pub leaf_pos: i64,
    pub items: Vec<Item>,
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl Node {
    /// An empty node: no prefix, no leaf, no children. The root of an empty
    /// tree starts like this.
    pub fn new() -> Self {
        Self {
            prefix_len: 0,
            prefix: [0u8; KEY_MAX],
            leaf_pos: 0,
            items: Vec::new(),
        }
    }

    /// A terminal node holding `prefix` as its edge label and pointing at
    /// `leaf_pos`.
    pub fn with_prefix(prefix: &[u8], leaf_pos: i64) -> Self {
        let mut node = Self::new();
        node.set_prefix(prefix);
        node.leaf_pos = leaf_pos;
        node
    }

    /// The significant prefix bytes.
    pub fn prefix_bytes(&self) -> &[u8] {
        &self.prefix[..self.prefix_len as usize]
    }

    /// Replaces the edge label. `prefix` must fit in [`KEY_MAX`]; callers
    /// only ever pass slices of validated keys or of other prefixes.
    pub fn set_prefix(&mut self, prefix: &[u8]) {
        debug_assert!(prefix.len() <= KEY_MAX);
        self.prefix = [0u8; KEY_MAX];
        self.prefix[..prefix.len()].copy_from_slice(prefix);
        self.prefix_len = prefix.len() as u8;
    }

    /// Binary-searches the sorted item table for `first_byte`.
    pub fn find_item(&self, first_byte: u8) -> Option<&Item> {
        self.items
            .binary_search_by_key(&first_byte, |it| it.first_byte)
            .ok()
            .map(|i| &self.items[i])
    }

    /// Reads the node at `pos`: the 74-byte fixed part, then the item table.
    pub fn load(file: &BlockFile, pos: i64) -> Result<Self, RecordError> {
        if pos < HEADER_SIZE as i64 {
            return Err(RecordError::Corrupt("node position out of range"));
        }
        let mut fixed = [0u8; NODE_FIXED];
        file.read_at(pos as u64, &mut fixed)?;
        let mut r = ByteReader::new(&fixed);
        let prefix_len = r.get_u8()?;
        if prefix_len as usize > KEY_MAX {
            return Err(RecordError::Corrupt("node prefix length out of range"));
        }
        let mut prefix = [0u8; KEY_MAX];
        r.get_bytes(&mut prefix)?;
        let leaf_pos = r.get_i64()?;
        let items_count = r.get_u8()? as usize;

        let mut table = [0u8; (MAX_CHILDREN - 1) * ITEM_SIZE];
        let table = &mut table[..items_count * ITEM_SIZE];
        file.read_at(pos as u64 + NODE_FIXED as u64, table)?;
        let mut r = ByteReader::new(table);
        let mut items = Vec::with_capacity(items_count);
        for _ in 0..items_count {
            items.push(Item {
                first_byte: r.get_u8()?,
                child_pos: r.get_i64()?,
            });
        }
        Ok(Self {
            prefix_len,
            prefix,
            leaf_pos,
            items,
        })
    }

    /// Appends the node (fixed part + item table, one contiguous frame) and
    /// returns its offset, which is the node's identity from now on.
    pub fn dump(&self, file: &BlockFile) -> Result<i64, RecordError> {
        if self.items.len() > MAX_CHILDREN - 1 {
            return Err(RecordError::Corrupt("child table overflow"));
        }
        let mut frame = [0u8; NODE_MAX_BYTES];
        let len = NODE_FIXED + self.items.len() * ITEM_SIZE;
        let mut w = ByteWriter::new(&mut frame[..len]);
        w.put_u8(self.prefix_len)?;
        w.put_bytes(&self.prefix)?;
        w.put_i64(self.leaf_pos)?;
        w.put_u8(self.items.len() as u8)?;
        for item in &self.items {
            w.put_u8(item.first_byte)?;
            w.put_i64(item.child_pos)?;
        }
        let pos = file.append(&frame[..len])?;
        Ok(pos as i64)
    }
}
