//! Prefix-anchored depth-first traversal.
//!
//! The iterator fuzzy-locates the node subtending all keys with the given
//! prefix, then walks that subtree in stored child order (ascending by first
//! byte), reassembling each key into a reusable buffer as it descends. Live
//! leaves are handed to the visitor together with the file handle, so the
//! visitor can read value bytes without further plumbing.

use crate::{DbError, Result, Transaction};
use blockio::BlockFile;
use records::{Leaf, Node, KEY_MAX};

/// A visitor's verdict after each `(key, leaf)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Keep walking.
    Continue,
    /// Halt the traversal cleanly; `iterate` returns `Ok`.
    Stop,
}

impl Transaction<'_> {
    /// Visits every live key in the snapshot that has `prefix` as a byte
    /// prefix, in depth-first stored order, each exactly once.
    ///
    /// An empty `prefix` walks the whole tree. Tombstones are skipped. The
    /// visitor may return [`Control::Stop`] to end the walk early; errors it
    /// returns propagate unchanged.
    pub fn iterate<F>(&self, prefix: &[u8], mut visitor: F) -> Result<()>
    where
        F: FnMut(&BlockFile, &[u8], Leaf) -> Result<Control>,
    {
        self.check_active()?;
        if prefix.len() > KEY_MAX {
            return Err(DbError::InvalidArgument("prefix too long"));
        }
        if self.footer().root_pos <= 0 {
            return Ok(());
        }
        let file = self.db().file();
        let Some((anchor_pos, matched)) = radix::find_anchor(file, self.footer().root_pos, prefix)?
        else {
            return Ok(());
        };
        let anchor = Node::load(file, anchor_pos)?;

        // One key buffer for the whole walk; each visit borrows a slice of it.
        let mut path = [0u8; KEY_MAX];
        path[..matched].copy_from_slice(&prefix[..matched]);
        walk(file, &anchor, &mut path, matched, &mut visitor)?;
        Ok(())
    }
}

fn walk<F>(
    file: &BlockFile,
    node: &Node,
    path: &mut [u8; KEY_MAX],
    base_len: usize,
    visitor: &mut F,
) -> Result<Control>
where
    F: FnMut(&BlockFile, &[u8], Leaf) -> Result<Control>,
{
    let edge = node.prefix_bytes();
    if base_len + edge.len() > KEY_MAX {
        // No stored key can be this long; skip the subtree.
        return Ok(Control::Continue);
    }
    path[base_len..base_len + edge.len()].copy_from_slice(edge);
    let len = base_len + edge.len();

    if node.leaf_pos > 0 && len > 0 {
        let leaf = Leaf::load(file, node.leaf_pos)?;
        if !leaf.is_tombstone() {
            if let Control::Stop = visitor(file, &path[..len], leaf)? {
                return Ok(Control::Stop);
            }
        }
    }

    for item in &node.items {
        let child = Node::load(file, item.child_pos)?;
        if let Control::Stop = walk(file, &child, path, len, visitor)? {
            return Ok(Control::Stop);
        }
    }
    Ok(Control::Continue)
}
