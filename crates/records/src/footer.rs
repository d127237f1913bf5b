//! Footer records: the commit protocol's atom.
//!
//! A footer is written at the first 32-byte-aligned slot at or after the data
//! tail. Recovery scans those slots backwards from the end of the file; the
//! newest slot whose checksum and bounds hold is the committed state. The
//! checksum is the bitwise complement of the counter sum, so a footer of
//! garbage (all zeroes, torn write, stale partial record) fails validation
//! and the scan keeps walking.

use crate::{RecordError, ALIGN, FOOTER_SIZE, HEADER_SIZE};
use blockio::BlockFile;
use codec::{ByteReader, ByteWriter};

/// Rounds `pos` up to the next multiple of [`ALIGN`].
pub fn align_up(pos: u64) -> u64 {
    (pos + ALIGN - 1) & !(ALIGN - 1)
}

/// A committed (or in-progress working) snapshot of the database state.
///
/// `tran_count` counts every put/del ever committed and doubles as the
/// per-leaf version stamp; `del_count` counts the tombstone-producing subset;
/// `root_pos` is the root node offset, `0` for an empty tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Footer {
    pub tran_count: u64,
    pub del_count: u64,
    pub root_pos: i64,
}

impl Footer {
    /// `!(tran_count + del_count + root_pos)`, wrapping. A valid footer
    /// satisfies `cksum + tran_count + del_count + root_pos + 1 == 0 mod 2^64`.
    fn checksum(&self) -> u64 {
        !(self
            .tran_count
            .wrapping_add(self.del_count)
            .wrapping_add(self.root_pos as u64))
    }

    /// Serializes the footer into the aligned slot at or after the current
    /// tail. Returns the slot offset. Durability ordering is the caller's
    /// job: data records must be synced before this is.
    pub fn dump(&self, file: &BlockFile) -> Result<u64, RecordError> {
        let mut buf = [0u8; FOOTER_SIZE];
        let cksum = self.checksum();
        let mut w = ByteWriter::new(&mut buf);
        w.put_u64(cksum)?;
        w.put_u64(self.tran_count)?;
        w.put_u64(self.del_count)?;
        w.put_i64(self.root_pos)?;
        w.put_u64(cksum)?;
        let slot = align_up(file.size()?);
        file.write_at(slot, &buf)?;
        Ok(slot)
    }

    /// Finds the most recent valid footer by scanning aligned slots backwards
    /// down to `HEADER_SIZE` inclusive. Slots that cannot be read or do not
    /// validate are skipped, so a truncated or garbage tail falls back to the
    /// previous commit. Returns the zero footer when no slot validates (an
    /// empty database is not an error).
    pub fn load_last(file: &BlockFile) -> Result<Footer, RecordError> {
        let size = file.size()?;
        let mut buf = [0u8; FOOTER_SIZE];
        let mut slot = align_up(size.saturating_sub(ALIGN));
        while slot >= HEADER_SIZE {
            if slot + FOOTER_SIZE as u64 <= size && file.read_at(slot, &mut buf).is_ok() {
                if let Some(footer) = Footer::validate(&buf, size) {
                    return Ok(footer);
                }
            }
            slot -= ALIGN;
        }
        Ok(Footer::default())
    }

    /// Parses `buf` and applies every validity condition. `None` means "keep
    /// scanning", not "corrupt database".
    fn validate(buf: &[u8; FOOTER_SIZE], file_size: u64) -> Option<Footer> {
        let mut r = ByteReader::new(buf);
        let cksum1 = r.get_u64().ok()?;
        let footer = Footer {
            tran_count: r.get_u64().ok()?,
            del_count: r.get_u64().ok()?,
            root_pos: r.get_i64().ok()?,
        };
        let cksum2 = r.get_u64().ok()?;
        if cksum1 != 0
            && cksum1 == cksum2
            && footer.root_pos >= 0
            && (footer.root_pos as u64) < file_size
            && cksum1 == footer.checksum()
        {
            Some(footer)
        } else {
            None
        }
    }
}
