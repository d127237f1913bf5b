use super::*;
use tempfile::tempdir;

// -------------------- Append --------------------

#[test]
fn append_returns_contiguous_offsets() {
    let dir = tempdir().unwrap();
    let f = BlockFile::open(dir.path().join("t.db")).unwrap();

    assert_eq!(f.append(b"hello").unwrap(), 0);
    assert_eq!(f.append(b"world").unwrap(), 5);
    assert_eq!(f.append(b"").unwrap(), 10); // empty append lands at the tail
    assert_eq!(f.size().unwrap(), 10);
}

#[test]
fn append_after_reads_still_lands_at_tail() {
    let dir = tempdir().unwrap();
    let f = BlockFile::open(dir.path().join("t.db")).unwrap();
    f.append(b"0123456789").unwrap();

    let mut buf = [0u8; 4];
    f.read_at(2, &mut buf).unwrap();
    assert_eq!(&buf, b"2345");

    // The read must not have moved where the next append goes.
    assert_eq!(f.append(b"xy").unwrap(), 10);
}

// -------------------- Positioned reads/writes --------------------

#[test]
fn read_at_past_end_is_unexpected_eof() {
    let dir = tempdir().unwrap();
    let f = BlockFile::open(dir.path().join("t.db")).unwrap();
    f.append(b"abc").unwrap();

    let mut buf = [0u8; 8];
    let err = f.read_at(1, &mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
}

#[test]
fn write_at_past_tail_extends_with_zeros() {
    let dir = tempdir().unwrap();
    let f = BlockFile::open(dir.path().join("t.db")).unwrap();
    f.append(b"ab").unwrap();
    f.write_at(6, b"zz").unwrap();
    assert_eq!(f.size().unwrap(), 8);

    let mut buf = [0u8; 8];
    f.read_at(0, &mut buf).unwrap();
    assert_eq!(&buf, b"ab\0\0\0\0zz");
}

#[test]
fn reopen_sees_previous_bytes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.db");
    {
        let f = BlockFile::open(&path).unwrap();
        f.append(b"persist").unwrap();
        f.sync().unwrap();
    }
    let f = BlockFile::open(&path).unwrap();
    assert_eq!(f.size().unwrap(), 7);
    let mut buf = [0u8; 7];
    f.read_at(0, &mut buf).unwrap();
    assert_eq!(&buf, b"persist");
}

// -------------------- Truncate --------------------

#[test]
fn truncate_cuts_the_tail() {
    let dir = tempdir().unwrap();
    let f = BlockFile::open(dir.path().join("t.db")).unwrap();
    f.append(b"0123456789").unwrap();
    f.truncate(4).unwrap();
    assert_eq!(f.size().unwrap(), 4);
    assert_eq!(f.append(b"!").unwrap(), 4);
}
