use super::*;
use blockio::BlockFile;
use tempfile::tempdir;

// -------------------- Helpers --------------------

fn open_db(name: &str, dir: &tempfile::TempDir) -> BlockFile {
    BlockFile::open(dir.path().join(name)).unwrap()
}

/// A file with a valid header and the tail padded so appends start at
/// HEADER_SIZE.
fn fresh_file(dir: &tempfile::TempDir) -> BlockFile {
    let file = open_db("t.db", dir);
    write_header(&file).unwrap();
    file
}

// -------------------- align_up --------------------

#[test]
fn align_up_rounds_to_slot_boundaries() {
    assert_eq!(align_up(0), 0);
    assert_eq!(align_up(1), 32);
    assert_eq!(align_up(32), 32);
    assert_eq!(align_up(33), 64);
    assert_eq!(align_up(128), 128);
    assert_eq!(align_up(129), 160);
}

// -------------------- Header --------------------

#[test]
fn header_round_trip() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    assert_eq!(file.size().unwrap(), HEADER_SIZE);
    check_header(&file).unwrap();
}

#[test]
fn header_rejects_bad_magic() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    file.write_at(0, b"????").unwrap();
    assert!(matches!(
        check_header(&file),
        Err(RecordError::Corrupt("bad magic"))
    ));
}

#[test]
fn header_rejects_wrong_version() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    file.write_at(4, &(VERSION + 1).to_le_bytes()).unwrap();
    assert!(matches!(
        check_header(&file),
        Err(RecordError::Corrupt("unsupported version"))
    ));
}

#[test]
fn header_rejects_short_file() {
    let dir = tempdir().unwrap();
    let file = open_db("short.db", &dir);
    file.append(b"ctdb").unwrap();
    assert!(matches!(
        check_header(&file),
        Err(RecordError::Corrupt("file shorter than header"))
    ));
}

// -------------------- Footer --------------------

#[test]
fn footer_round_trip_via_backward_scan() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    let footer = Footer {
        tran_count: 7,
        del_count: 2,
        root_pos: 130,
    };
    // root_pos must be < file size for the footer to validate
    file.append(&[0u8; 64]).unwrap();
    footer.dump(&file).unwrap();
    assert_eq!(Footer::load_last(&file).unwrap(), footer);
}

#[test]
fn footer_slot_is_aligned_and_at_or_after_tail() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    file.append(&[0u8; 5]).unwrap(); // tail = 133
    let slot = Footer::default().dump(&file).unwrap();
    assert_eq!(slot, 160);
    assert_eq!(slot % ALIGN, 0);
}

#[test]
fn empty_file_yields_zero_footer() {
    let dir = tempdir().unwrap();
    let file = open_db("empty.db", &dir);
    assert_eq!(Footer::load_last(&file).unwrap(), Footer::default());
}

#[test]
fn header_only_file_yields_zero_footer() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    assert_eq!(Footer::load_last(&file).unwrap(), Footer::default());
}

#[test]
fn newest_valid_footer_wins() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    file.append(&[0u8; 40]).unwrap();
    let older = Footer {
        tran_count: 1,
        del_count: 0,
        root_pos: 130,
    };
    older.dump(&file).unwrap();
    file.append(&[0u8; 40]).unwrap();
    let newer = Footer {
        tran_count: 2,
        del_count: 1,
        root_pos: 150,
    };
    newer.dump(&file).unwrap();
    assert_eq!(Footer::load_last(&file).unwrap(), newer);
}

#[test]
fn garbage_tail_falls_back_to_previous_footer() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    file.append(&[0u8; 40]).unwrap();
    let committed = Footer {
        tran_count: 3,
        del_count: 0,
        root_pos: 140,
    };
    committed.dump(&file).unwrap();
    // Unreachable bytes appended after the commit, as a rolled-back
    // transaction leaves behind. No footer points at them.
    file.append(&[0xAAu8; 200]).unwrap();
    assert_eq!(Footer::load_last(&file).unwrap(), committed);
}

#[test]
fn corrupted_checksum_is_skipped() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    file.append(&[0u8; 40]).unwrap();
    let good = Footer {
        tran_count: 5,
        del_count: 1,
        root_pos: 132,
    };
    good.dump(&file).unwrap();
    file.append(&[0u8; 17]).unwrap();
    let slot = Footer {
        tran_count: 6,
        del_count: 1,
        root_pos: 132,
    }
    .dump(&file)
    .unwrap();
    // Flip one checksum byte of the newer footer; the scan must fall back.
    let mut byte = [0u8; 1];
    file.read_at(slot, &mut byte).unwrap();
    file.write_at(slot, &[byte[0] ^ 0xFF]).unwrap();
    assert_eq!(Footer::load_last(&file).unwrap(), good);
}

#[test]
fn footer_with_root_beyond_file_size_is_invalid() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    Footer {
        tran_count: 1,
        del_count: 0,
        root_pos: 1 << 40,
    }
    .dump(&file)
    .unwrap();
    assert_eq!(Footer::load_last(&file).unwrap(), Footer::default());
}

#[test]
fn footer_immediately_after_header_is_found() {
    // The scan bound is inclusive: a footer at exactly HEADER_SIZE (an
    // empty-but-committed database) must be recoverable.
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    Footer::default().dump(&file).unwrap();
    // The zero footer checksums to !0 which is non-zero, so it validates.
    assert_eq!(Footer::load_last(&file).unwrap(), Footer::default());
    assert_eq!(file.size().unwrap(), HEADER_SIZE + FOOTER_SIZE as u64);
}

// -------------------- Node --------------------

#[test]
fn node_round_trip_with_items() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    let mut node = Node::with_prefix(b"app", 1234);
    node.items = vec![
        Item {
            first_byte: b'l',
            child_pos: 200,
        },
        Item {
            first_byte: b'r',
            child_pos: 300,
        },
    ];
    let pos = node.dump(&file).unwrap();
    assert_eq!(pos, HEADER_SIZE as i64);
    assert_eq!(
        file.size().unwrap(),
        HEADER_SIZE + (NODE_FIXED + 2 * ITEM_SIZE) as u64
    );

    let loaded = Node::load(&file, pos).unwrap();
    assert_eq!(loaded, node);
    assert_eq!(loaded.prefix_bytes(), b"app");
    assert_eq!(loaded.find_item(b'r').unwrap().child_pos, 300);
    assert!(loaded.find_item(b'x').is_none());
}

#[test]
fn node_round_trip_without_items() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    let node = Node::with_prefix(b"k", 99);
    let pos = node.dump(&file).unwrap();
    let loaded = Node::load(&file, pos).unwrap();
    assert_eq!(loaded, node);
    assert!(loaded.items.is_empty());
}

#[test]
fn node_load_rejects_positions_inside_header() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    assert!(matches!(
        Node::load(&file, 0),
        Err(RecordError::Corrupt("node position out of range"))
    ));
    assert!(matches!(
        Node::load(&file, 64),
        Err(RecordError::Corrupt(_))
    ));
}

#[test]
fn node_load_rejects_oversized_prefix_len() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    let pos = Node::new().dump(&file).unwrap();
    file.write_at(pos as u64, &[KEY_MAX as u8 + 1]).unwrap();
    assert!(matches!(
        Node::load(&file, pos),
        Err(RecordError::Corrupt("node prefix length out of range"))
    ));
}

#[test]
fn node_dump_rejects_overfull_item_table() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    let mut node = Node::new();
    node.items = (0..MAX_CHILDREN)
        .map(|b| Item {
            first_byte: b as u8,
            child_pos: 128 + b as i64,
        })
        .collect();
    assert!(matches!(
        node.dump(&file),
        Err(RecordError::Corrupt("child table overflow"))
    ));
}

// -------------------- Leaf --------------------

#[test]
fn leaf_round_trip() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    let leaf = Leaf {
        version: 41,
        value_len: 5,
        value_pos: 128,
    };
    let pos = leaf.dump(&file).unwrap();
    assert_eq!(Leaf::load(&file, pos).unwrap(), leaf);
    assert!(!leaf.is_tombstone());
}

#[test]
fn zero_length_leaf_is_a_tombstone() {
    let leaf = Leaf {
        version: 1,
        value_len: 0,
        value_pos: 128,
    };
    assert!(leaf.is_tombstone());
}

#[test]
fn leaf_load_rejects_positions_inside_header() {
    let dir = tempdir().unwrap();
    let file = fresh_file(&dir);
    assert!(matches!(
        Leaf::load(&file, 0),
        Err(RecordError::Corrupt("leaf position out of range"))
    ));
}
