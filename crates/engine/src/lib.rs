//! # Engine — the transactional radix-tree store
//!
//! Ties the [`blockio`], [`records`], and [`radix`] crates into a complete
//! embedded, single-file, append-only key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                  DATABASE                     │
//! │                                               │
//! │ open() → header check / create + zero footer  │
//! │ begin() → backward footer scan → snapshot     │
//! │                                               │
//! │ ┌──────────────── TRANSACTION ──────────────┐ │
//! │ │ put/del → append value, leaf, new path    │ │
//! │ │           (working footer updated in RAM) │ │
//! │ │ get     → descend tree from snapshot root │ │
//! │ │ iterate → fuzzy anchor + depth-first walk │ │
//! │ │ commit  → fsync, footer at aligned slot,  │ │
//! │ │           fsync                           │ │
//! │ │ rollback→ drop the working footer         │ │
//! │ └───────────────────────────────────────────┘ │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module           | Purpose                                          |
//! |------------------|--------------------------------------------------|
//! | `lib.rs`         | `Database`, `DbError`, open/begin, value reads   |
//! | [`transaction`]  | `Transaction`: get/put/del/commit/rollback       |
//! | [`iterate`]      | prefix-anchored depth-first traversal            |
//! | [`vacuum`]       | live-set copy into a fresh database file         |
//!
//! ## Crash safety
//!
//! Mutations only ever append; the bytes of a committed tree are never
//! touched again. A commit syncs the appended records, writes a checksummed
//! footer at an aligned slot past the tail, and syncs again, so the footer
//! can only become durable after everything it references. Recovery scans
//! footer slots backwards and lands on the newest commit whose footer
//! survived; anything after it is unreachable garbage and simply ignored.

mod iterate;
mod transaction;
mod vacuum;

pub use iterate::Control;
pub use records::{Footer, Leaf, KEY_MAX, VALUE_MAX};
pub use transaction::Transaction;

use blockio::BlockFile;
use radix::IndexError;
use records::RecordError;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Errors surfaced by the public API.
///
/// "Key not present" is not an error: lookups return `Ok(None)`. Everything
/// here is a genuine failure the caller may want to react to (typically by
/// rolling back the transaction).
#[derive(Debug, Error)]
pub enum DbError {
    /// A key or value violates its documented bounds.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The transaction has already been committed or rolled back.
    #[error("transaction is no longer active")]
    InvalidState,

    /// On-disk bytes inconsistent with the file format.
    #[error("corrupt database: {0}")]
    Corrupt(&'static str),

    /// An underlying read/write/seek/sync failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A node's child table cannot take another distinct first byte.
    #[error("node child table is full")]
    NodeFull,

    /// Invariant violation; unreachable with a well-formed file.
    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
}

impl From<RecordError> for DbError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::Io(e) => DbError::Io(e),
            RecordError::Corrupt(msg) => DbError::Corrupt(msg),
            // Record frames are fixed-size buffers sized by the layer that
            // writes them; a codec failure there is a layout bug.
            RecordError::Codec(_) => DbError::Internal("record frame layout"),
        }
    }
}

impl From<IndexError> for DbError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::Record(e) => e.into(),
            IndexError::NodeFull => DbError::NodeFull,
            IndexError::Internal(msg) => DbError::Internal(msg),
        }
    }
}

type Result<T> = std::result::Result<T, DbError>;

/// One open database file.
///
/// Opening creates the file (header plus a committed zero footer) when it is
/// new, and verifies the header otherwise. The handle is closed when the
/// database is dropped.
#[derive(Debug)]
pub struct Database {
    file: BlockFile,
}

impl Database {
    /// Opens or creates the database at `path`.
    ///
    /// A brand-new file gets the 128-byte header and an immediately-synced
    /// zero footer, so a `begin` on it (or on a copy truncated back to that
    /// point) finds a valid empty state.
    ///
    /// # Errors
    ///
    /// [`DbError::Corrupt`] if an existing file's magic or version does not
    /// match; [`DbError::Io`] on filesystem failures.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = BlockFile::open(path)?;
        if file.size()? == 0 {
            records::write_header(&file)?;
            Footer::default().dump(&file)?;
            file.sync()?;
        } else {
            records::check_header(&file)?;
        }
        Ok(Self { file })
    }

    /// Starts a transaction on the most recent committed state.
    ///
    /// Scans backwards for the newest valid footer and snapshots it; if none
    /// validates (fresh or fully-truncated file), the snapshot is the empty
    /// state, not an error.
    ///
    /// One writer at a time: transactions do not lock the file, and running
    /// two mutating transactions over one database concurrently leaves the
    /// on-disk tree in an unspecified state. Callers serialize externally.
    pub fn begin(&self) -> Result<Transaction<'_>> {
        let footer = Footer::load_last(&self.file)?;
        Ok(Transaction::new(self, footer))
    }

    /// The underlying file handle. Value bytes are read through this, both
    /// directly and from iterator visitors.
    pub fn file(&self) -> &BlockFile {
        &self.file
    }

    /// Reads the value bytes a leaf points at.
    pub fn read_value(&self, leaf: &Leaf) -> Result<Vec<u8>> {
        if leaf.value_pos < records::HEADER_SIZE as i64 {
            return Err(DbError::Corrupt("value position out of range"));
        }
        if leaf.value_len > VALUE_MAX {
            return Err(DbError::Corrupt("value length out of range"));
        }
        let mut buf = vec![0u8; leaf.value_len as usize];
        self.file.read_at(leaf.value_pos as u64, &mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests;
