//! Vacuum: copy the live set into a fresh file.
//!
//! Append-only writes never reclaim anything: superseded paths, rolled-back
//! tails, and tombstones all stay in the file. Vacuum walks the reachable
//! tree of a snapshot and rewrites it (values, leaves, nodes) into a second
//! database, then commits a footer there. Dead bytes simply are not copied.
//! Tombstoned leaves are dropped too (the rewritten node carries no leaf),
//! which is what finally erases deleted keys.

use crate::{Database, DbError, Result, Transaction};
use blockio::BlockFile;
use records::{Footer, Leaf, Node, HEADER_SIZE};

/// Values are streamed through a scratch buffer of this size rather than
/// slurped whole; a value can be up to 1 GiB.
const COPY_CHUNK: usize = 64 * 1024;

impl Transaction<'_> {
    /// Copies this snapshot's live keys into `dst`, which should be a freshly
    /// opened, empty database, then commits there.
    ///
    /// The destination footer carries this snapshot's `tran_count` (so leaf
    /// version stamps stay meaningful) and a `del_count` of zero, since the
    /// copy contains no tombstones.
    pub fn vacuum_into(&self, dst: &Database) -> Result<()> {
        self.check_active()?;
        let src = self.db().file();
        let dst_file = dst.file();

        let mut scratch = vec![0u8; COPY_CHUNK];
        let new_root = if self.footer().root_pos > 0 {
            copy_subtree(src, dst_file, self.footer().root_pos, &mut scratch)?
        } else {
            0
        };

        let footer = Footer {
            tran_count: self.footer().tran_count,
            del_count: 0,
            root_pos: new_root,
        };
        dst_file.sync()?;
        footer.dump(dst_file)?;
        dst_file.sync()?;
        Ok(())
    }
}

/// Rewrites the subtree rooted at `node_pos` into `dst`, depth-first, and
/// returns the rewritten node's offset there. Children are rewritten before
/// their parent so the parent's item table can point at the new offsets.
fn copy_subtree(
    src: &BlockFile,
    dst: &BlockFile,
    node_pos: i64,
    scratch: &mut Vec<u8>,
) -> Result<i64> {
    let mut node = Node::load(src, node_pos)?;

    let mut new_leaf_pos = 0i64;
    if node.leaf_pos > 0 {
        let leaf = Leaf::load(src, node.leaf_pos)?;
        if !leaf.is_tombstone() {
            let value_pos = copy_value(src, dst, leaf.value_pos, leaf.value_len, scratch)?;
            new_leaf_pos = Leaf {
                version: leaf.version,
                value_len: leaf.value_len,
                value_pos,
            }
            .dump(dst)?;
        }
    }
    node.leaf_pos = new_leaf_pos;

    for i in 0..node.items.len() {
        node.items[i].child_pos = copy_subtree(src, dst, node.items[i].child_pos, scratch)?;
    }
    Ok(node.dump(dst)?)
}

/// Streams `len` value bytes from `src` to the tail of `dst`, returning the
/// offset they start at.
fn copy_value(
    src: &BlockFile,
    dst: &BlockFile,
    pos: i64,
    len: u32,
    scratch: &mut Vec<u8>,
) -> Result<i64> {
    if pos < HEADER_SIZE as i64 {
        return Err(DbError::Corrupt("value position out of range"));
    }
    let new_pos = dst.size()?;
    let len = len as u64;
    let mut copied = 0u64;
    while copied < len {
        let n = ((len - copied) as usize).min(scratch.len());
        let chunk = &mut scratch[..n];
        src.read_at(pos as u64 + copied, chunk)?;
        dst.append(chunk)?;
        copied += n as u64;
    }
    Ok(new_pos as i64)
}
