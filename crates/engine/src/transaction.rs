//! Transactions: snapshot reads, append-only writes, atomic publication.
//!
//! A transaction is a footer snapshot plus a termination flag. Reads descend
//! from the snapshot's root and never see later appends. Writes append new
//! records and update the snapshot in memory only; nothing on disk references
//! them until `commit` publishes a footer. Rollback is therefore free: drop
//! the in-memory footer and the appended tail is unreachable garbage.

use crate::{Database, DbError, Result};
use records::{Footer, Leaf, Node, KEY_MAX, VALUE_MAX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    Committed,
    Aborted,
}

/// A single-writer transaction over a [`Database`].
///
/// Obtained from [`Database::begin`]. Every operation fails with
/// [`DbError::InvalidState`] once the transaction has been committed or
/// rolled back.
#[derive(Debug)]
pub struct Transaction<'db> {
    db: &'db Database,
    footer: Footer,
    state: State,
}

fn check_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(DbError::InvalidArgument("key must not be empty"));
    }
    if key.len() > KEY_MAX {
        return Err(DbError::InvalidArgument("key too long"));
    }
    Ok(())
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(db: &'db Database, footer: Footer) -> Self {
        Self {
            db,
            footer,
            state: State::Active,
        }
    }

    pub(crate) fn check_active(&self) -> Result<()> {
        match self.state {
            State::Active => Ok(()),
            _ => Err(DbError::InvalidState),
        }
    }

    pub(crate) fn db(&self) -> &'db Database {
        self.db
    }

    /// The working footer's snapshot of the committed-plus-pending state.
    pub(crate) fn footer(&self) -> &Footer {
        &self.footer
    }

    /// Operations applied across the database's history, including this
    /// transaction's pending ones.
    pub fn tran_count(&self) -> u64 {
        self.footer.tran_count
    }

    /// Tombstone-producing operations across the database's history,
    /// including this transaction's pending ones.
    pub fn del_count(&self) -> u64 {
        self.footer.del_count
    }

    /// Looks a key up in the snapshot, returning its leaf if present and
    /// live.
    ///
    /// `Ok(None)` covers "never written", "path diverges", and "tombstoned"
    /// alike. The leaf's value bytes are read separately, via
    /// [`Database::read_value`] or the file handle.
    pub fn get(&self, key: &[u8]) -> Result<Option<Leaf>> {
        self.check_active()?;
        check_key(key)?;
        if self.footer.root_pos <= 0 {
            return Ok(None);
        }
        let file = self.db.file();
        let Some(node_pos) = radix::find_node(file, self.footer.root_pos, key)? else {
            return Ok(None);
        };
        let node = Node::load(file, node_pos)?;
        if node.leaf_pos <= 0 {
            return Ok(None);
        }
        let leaf = Leaf::load(file, node.leaf_pos)?;
        if leaf.is_tombstone() {
            return Ok(None);
        }
        Ok(Some(leaf))
    }

    /// Writes `key = value` into the working state.
    ///
    /// Appends the value bytes, a leaf stamped with the current operation
    /// counter, and a rewritten path from the touched node up to a new root;
    /// then advances the working footer. An empty `value` writes a tombstone
    /// (see [`del`](Transaction::del)).
    ///
    /// On failure the working footer is left exactly as before the call; any
    /// bytes already appended stay behind as unreachable garbage, which the
    /// next vacuum discards.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_active()?;
        check_key(key)?;
        if value.len() as u64 > VALUE_MAX as u64 {
            return Err(DbError::InvalidArgument("value too long"));
        }

        let file = self.db.file();
        let mut root = if self.footer.root_pos > 0 {
            Node::load(file, self.footer.root_pos)?
        } else {
            Node::new()
        };

        let value_pos = file.append(value)? as i64;
        let leaf = Leaf {
            version: self.footer.tran_count,
            value_len: value.len() as u32,
            value_pos,
        };
        let leaf_pos = leaf.dump(file)?;
        let new_root_pos = radix::append_subtree(file, &mut root, key, leaf_pos)?;

        let tran_count = self
            .footer
            .tran_count
            .checked_add(1)
            .ok_or(DbError::Internal("operation counter overflow"))?;

        // All fallible steps are done; the working footer moves atomically.
        self.footer.root_pos = new_root_pos;
        self.footer.tran_count = tran_count;
        if value.is_empty() {
            self.footer.del_count += 1;
        }
        Ok(())
    }

    /// Deletes a key by writing a tombstone: a put of the empty value. The
    /// path is rewritten like any other put; space is reclaimed by vacuum,
    /// not here.
    pub fn del(&mut self, key: &[u8]) -> Result<()> {
        self.put(key, b"")
    }

    /// Publishes the working state durably.
    ///
    /// The appended records are synced first, then the footer is written at
    /// the next aligned slot and synced; the footer cannot become durable
    /// ahead of the records it references. The transaction is terminated
    /// even if publication fails; a half-committed transaction must not be
    /// retried, only begun anew.
    pub fn commit(&mut self) -> Result<()> {
        self.check_active()?;
        self.state = State::Committed;
        let file = self.db.file();
        file.sync()?;
        self.footer.dump(file)?;
        file.sync()?;
        Ok(())
    }

    /// Abandons the working state. The records appended by this transaction
    /// remain on disk but nothing references them; every later `begin` sees
    /// the last committed footer.
    pub fn rollback(&mut self) {
        if self.state == State::Active {
            self.state = State::Aborted;
        }
    }
}
