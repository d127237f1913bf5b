//! # Radix — the in-file compressed-trie index
//!
//! Lookup and insertion over the node records of [`records`]. The tree lives
//! entirely in the database file; this crate never holds more of it in memory
//! than the path currently being walked.
//!
//! ## Shape
//!
//! Each node carries an edge label (its `prefix`) and a table of child items,
//! one per distinct next byte, sorted for binary search. Lookup descends by
//! consuming the node's prefix and then the child matching the next key byte.
//!
//! ## Copy-on-write insertion
//!
//! Records are immutable once appended, so [`append_subtree`] rewrites the
//! path from the mutated point back up to the root: every node on the path is
//! appended afresh with its child table pointing at the new offsets, and the
//! new root offset is returned. Untouched subtrees keep their old offsets and
//! are shared between the old and new roots, which is what makes rollback
//! free and old roots readable until vacuum.
//!
//! Recursion depth is bounded by the key length cap (64), so the stack is
//! never deeper than 64 frames.

use blockio::BlockFile;
use records::{Item, Node, RecordError, MAX_CHILDREN};
use thiserror::Error;

/// Errors from index traversal and insertion.
#[derive(Debug, Error)]
pub enum IndexError {
    /// A record failed to load or store.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// A node's child table cannot take another distinct first byte.
    #[error("node child table is full")]
    NodeFull,

    /// Self-consistency failure; unreachable with a well-formed file.
    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
}

type Result<T> = std::result::Result<T, IndexError>;

/// Longest common prefix length of two byte strings.
fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Exact lookup: the offset of the node whose accumulated path equals `key`,
/// or `None` if the key diverges from the tree. The node may still carry no
/// leaf (or a tombstone); the caller inspects `leaf_pos`.
pub fn find_node(file: &BlockFile, root_pos: i64, key: &[u8]) -> Result<Option<i64>> {
    Ok(descend(file, root_pos, key, 0, false)?.map(|(pos, _)| pos))
}

/// Fuzzy lookup for prefix iteration: the node where descent stops with the
/// whole of `prefix` consumed, together with the number of prefix bytes
/// consumed *before* entering that node. The prefix may end exactly at the
/// node's boundary or anywhere inside its edge label; if it diverges from the
/// tree instead, there is no anchor.
pub fn find_anchor(file: &BlockFile, root_pos: i64, prefix: &[u8]) -> Result<Option<(i64, usize)>> {
    descend(file, root_pos, prefix, 0, true)
}

fn descend(
    file: &BlockFile,
    pos: i64,
    key: &[u8],
    consumed: usize,
    fuzzy: bool,
) -> Result<Option<(i64, usize)>> {
    if consumed == key.len() {
        return Ok(Some((pos, consumed)));
    }
    let node = Node::load(file, pos)?;
    let entered_at = consumed;
    let rest = &key[consumed..];
    let matched = common_prefix_len(rest, node.prefix_bytes());

    if matched == node.prefix_bytes().len() {
        let consumed = consumed + matched;
        if consumed == key.len() {
            return Ok(Some((pos, entered_at)));
        }
        return match node.find_item(key[consumed]) {
            Some(item) => descend(file, item.child_pos, key, consumed, fuzzy),
            None => Ok(None),
        };
    }
    if fuzzy && matched == rest.len() {
        // Prefix exhausted inside this node's edge: the whole subtree under
        // this node extends the prefix.
        return Ok(Some((pos, entered_at)));
    }
    // Diverged from the edge label.
    Ok(None)
}

/// Links `child_pos` under `node` for edge byte `first_byte`, keeping the
/// item table sorted and unique. An existing entry is repointed in place.
pub fn put_child(node: &mut Node, first_byte: u8, child_pos: i64) -> Result<()> {
    if child_pos <= 0 {
        return Err(IndexError::Internal("child position must be positive"));
    }
    match node
        .items
        .binary_search_by_key(&first_byte, |it| it.first_byte)
    {
        Ok(i) => node.items[i].child_pos = child_pos,
        Err(i) => {
            if node.items.len() + 1 >= MAX_CHILDREN {
                return Err(IndexError::NodeFull);
            }
            node.items.insert(
                i,
                Item {
                    first_byte,
                    child_pos,
                },
            );
        }
    }
    Ok(())
}

/// Copy-on-write insert of `leaf_pos` under `node` at the remaining key
/// `key`. `node` is the caller's mutable copy of a loaded node (or a fresh
/// empty root); it is modified, appended, and its new offset returned. The
/// caller re-links that offset into the parent, or publishes it as the new
/// root at the top of the recursion.
pub fn append_subtree(
    file: &BlockFile,
    node: &mut Node,
    key: &[u8],
    leaf_pos: i64,
) -> Result<i64> {
    if key.is_empty() {
        // Exact match at this node. Written records never change, so
        // "replace" means appending this node again with the new leaf.
        node.leaf_pos = leaf_pos;
        return Ok(node.dump(file)?);
    }

    let first = key[0];
    let Some(item) = node.find_item(first).copied() else {
        // No edge starts with this byte: hang the whole remaining key off a
        // single new terminal node.
        let fresh = Node::with_prefix(key, leaf_pos);
        let fresh_pos = fresh.dump(file)?;
        put_child(node, first, fresh_pos)?;
        return Ok(node.dump(file)?);
    };

    let mut child = Node::load(file, item.child_pos)?;
    let child_prefix = child.prefix;
    let child_prefix_len = child.prefix_len as usize;
    let matched = common_prefix_len(key, child.prefix_bytes());

    if matched == child_prefix_len {
        // The child's whole edge is on the key's path: descend.
        let new_child_pos = append_subtree(file, &mut child, &key[matched..], leaf_pos)?;
        put_child(node, first, new_child_pos)?;
        return Ok(node.dump(file)?);
    }

    if matched == key.len() {
        // The new key ends inside the child's edge: split the edge, putting
        // a new leaf-bearing node above the (shortened) old child.
        child.set_prefix(&child_prefix[matched..child_prefix_len]);
        let moved_pos = child.dump(file)?;
        let mut mid = Node::with_prefix(key, leaf_pos);
        put_child(&mut mid, child_prefix[matched], moved_pos)?;
        let mid_pos = mid.dump(file)?;
        put_child(node, first, mid_pos)?;
        return Ok(node.dump(file)?);
    }

    // Key and edge share a proper prefix and then diverge: split out a common
    // node with the old child and a fresh terminal node as its two children.
    let mut common = Node::with_prefix(&key[..matched], 0);
    child.set_prefix(&child_prefix[matched..child_prefix_len]);
    let moved_pos = child.dump(file)?;
    put_child(&mut common, child_prefix[matched], moved_pos)?;
    let fresh = Node::with_prefix(&key[matched..], leaf_pos);
    let fresh_pos = fresh.dump(file)?;
    put_child(&mut common, key[matched], fresh_pos)?;
    let common_pos = common.dump(file)?;
    put_child(node, first, common_pos)?;
    Ok(node.dump(file)?)
}
