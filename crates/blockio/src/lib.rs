//! # Blockio — positioned I/O over the database file
//!
//! Abstracts the single database file as a seekable byte stream with an
//! append-to-end primitive. The whole engine funnels its disk access through
//! [`BlockFile`]: records are appended at the tail, reads are positioned, and
//! the only in-place writes are the header region and the aligned footer
//! slots.
//!
//! Every method takes `&self`: seeking happens through a `&File`, which the
//! standard library implements `Read`/`Write`/`Seek` for. That lets a read
//! path (point lookups, iteration) work through a shared reference while the
//! owning handle stays in one place. The handle carries no buffering and no
//! position state of its own, so interleaved reads and appends cannot observe
//! each other's cursor.
//!
//! Errors at this layer are plain [`std::io::Error`]; callers wrap them into
//! their own error types.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// One open database file.
///
/// Created (empty) if absent, opened read+write otherwise. Dropping the
/// handle closes the file.
#[derive(Debug)]
pub struct BlockFile {
    file: File,
}

impl BlockFile {
    /// Opens `path` read+write, creating an empty file if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        Ok(Self { file })
    }

    /// Current file size in bytes.
    pub fn size(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Fills `buf` from `pos`. Fails with `UnexpectedEof` if the file ends
    /// before `buf` is full.
    pub fn read_at(&self, pos: u64, buf: &mut [u8]) -> io::Result<()> {
        let mut f = &self.file;
        f.seek(SeekFrom::Start(pos))?;
        f.read_exact(buf)
    }

    /// Appends `buf` at the current tail and returns the offset its first
    /// byte landed at. Consecutive appends are contiguous.
    pub fn append(&self, buf: &[u8]) -> io::Result<u64> {
        let mut f = &self.file;
        let pos = f.seek(SeekFrom::End(0))?;
        f.write_all(buf)?;
        Ok(pos)
    }

    /// Writes `buf` at `pos`, extending the file if the slot lies past the
    /// tail. Used only for the header region and the aligned footer slots;
    /// data records are never rewritten.
    pub fn write_at(&self, pos: u64, buf: &[u8]) -> io::Result<()> {
        let mut f = &self.file;
        f.seek(SeekFrom::Start(pos))?;
        f.write_all(buf)
    }

    /// Forces written bytes to disk (`fsync`).
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_all()
    }

    /// Cuts the file down to `len` bytes. Crash-simulation hook for tests;
    /// the engine itself never shrinks the file.
    pub fn truncate(&self, len: u64) -> io::Result<()> {
        self.file.set_len(len)
    }
}

#[cfg(test)]
mod tests;
