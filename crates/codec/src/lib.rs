//! # Codec — fixed-width little-endian byte cursors
//!
//! Serialization primitives for the on-disk record layouts. Every field in
//! the database file is fixed-width little-endian; variable-length strings do
//! not exist at this layer (key bytes are stored zero-padded to their cap by
//! the record layer).
//!
//! Both cursors borrow a caller-provided slice and advance an internal
//! position. Nothing here allocates: a write that does not fit and a read
//! that runs past the end both fail with [`CodecError::ShortBuffer`] and
//! leave the cursor where it was.
//!
//! ## Example
//!
//! ```rust
//! use codec::{ByteReader, ByteWriter};
//!
//! let mut buf = [0u8; 12];
//! let mut w = ByteWriter::new(&mut buf);
//! w.put_u32(7).unwrap();
//! w.put_i64(-1).unwrap();
//! assert_eq!(w.position(), 12);
//!
//! let mut r = ByteReader::new(&buf);
//! assert_eq!(r.get_u32().unwrap(), 7);
//! assert_eq!(r.get_i64().unwrap(), -1);
//! ```

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

/// Errors produced by the byte cursors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Fewer bytes remain in the buffer than the operation requires.
    #[error("short buffer: need {need} bytes, {remaining} remaining")]
    ShortBuffer {
        /// Bytes the operation required.
        need: usize,
        /// Bytes left between the cursor and the end of the slice.
        remaining: usize,
    },
}

type Result<T> = std::result::Result<T, CodecError>;

/// Writing cursor over a mutable byte slice.
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    /// Wraps `buf` with the cursor at offset 0.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the end of the slice.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn claim(&mut self, need: usize) -> Result<&mut [u8]> {
        let remaining = self.buf.len() - self.pos;
        if remaining < need {
            return Err(CodecError::ShortBuffer { need, remaining });
        }
        let start = self.pos;
        self.pos += need;
        Ok(&mut self.buf[start..start + need])
    }

    /// Writes one byte.
    pub fn put_u8(&mut self, v: u8) -> Result<()> {
        self.claim(1)?[0] = v;
        Ok(())
    }

    /// Writes a `u16` little-endian.
    pub fn put_u16(&mut self, v: u16) -> Result<()> {
        LittleEndian::write_u16(self.claim(2)?, v);
        Ok(())
    }

    /// Writes a `u32` little-endian.
    pub fn put_u32(&mut self, v: u32) -> Result<()> {
        LittleEndian::write_u32(self.claim(4)?, v);
        Ok(())
    }

    /// Writes a `u64` little-endian.
    pub fn put_u64(&mut self, v: u64) -> Result<()> {
        LittleEndian::write_u64(self.claim(8)?, v);
        Ok(())
    }

    /// Writes an `i64` little-endian.
    pub fn put_i64(&mut self, v: i64) -> Result<()> {
        LittleEndian::write_i64(self.claim(8)?, v);
        Ok(())
    }

    /// Copies `src` verbatim. The caller fixes the length; there is no
    /// length prefix at this layer.
    pub fn put_bytes(&mut self, src: &[u8]) -> Result<()> {
        self.claim(src.len())?.copy_from_slice(src);
        Ok(())
    }
}

/// Reading cursor over a byte slice.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Wraps `buf` with the cursor at offset 0.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the slice.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, need: usize) -> Result<&'a [u8]> {
        let remaining = self.buf.len() - self.pos;
        if remaining < need {
            return Err(CodecError::ShortBuffer { need, remaining });
        }
        let start = self.pos;
        self.pos += need;
        Ok(&self.buf[start..start + need])
    }

    /// Reads one byte.
    pub fn get_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a `u16` little-endian.
    pub fn get_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    /// Reads a `u32` little-endian.
    pub fn get_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    /// Reads a `u64` little-endian.
    pub fn get_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    /// Reads an `i64` little-endian.
    pub fn get_i64(&mut self) -> Result<i64> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    /// Copies the next `dst.len()` bytes into `dst`.
    pub fn get_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        dst.copy_from_slice(self.take(dst.len())?);
        Ok(())
    }

    /// Borrows the next `len` bytes without copying.
    pub fn get_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len)
    }
}
