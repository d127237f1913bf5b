use crate::{Control, Database};
use records::{Leaf, Node};

pub fn open_db(dir: &tempfile::TempDir, name: &str) -> Database {
    Database::open(dir.path().join(name)).unwrap()
}

/// Applies all pairs in one transaction and commits.
pub fn put_commit(db: &Database, pairs: &[(&[u8], &[u8])]) {
    let mut t = db.begin().unwrap();
    for &(k, v) in pairs {
        t.put(k, v).unwrap();
    }
    t.commit().unwrap();
}

/// Begins a fresh snapshot and resolves `key` to its value bytes.
pub fn get_value(db: &Database, key: &[u8]) -> Option<Vec<u8>> {
    let t = db.begin().unwrap();
    t.get(key)
        .unwrap()
        .map(|leaf| db.read_value(&leaf).unwrap())
}

/// Collects every live key under `prefix` from a fresh snapshot.
pub fn collect_keys(db: &Database, prefix: &[u8]) -> Vec<Vec<u8>> {
    let t = db.begin().unwrap();
    let mut keys = Vec::new();
    t.iterate(prefix, |_, key, _| {
        keys.push(key.to_vec());
        Ok(Control::Continue)
    })
    .unwrap();
    keys
}

/// Deterministic xorshift key generator for load tests.
pub struct KeyGen(u64);

impl KeyGen {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub fn next_key(&mut self, len: usize) -> Vec<u8> {
        let mut key = Vec::with_capacity(len);
        while key.len() < len {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            key.extend_from_slice(&self.0.to_le_bytes());
        }
        key.truncate(len);
        key
    }
}

/// Walks every node reachable from the committed root, asserting the
/// structural invariants: items sorted and unique by first byte, each child's
/// first prefix byte equal to its item entry.
pub fn check_reachable_invariants(db: &Database) {
    let footer = records::Footer::load_last(db.file()).unwrap();
    if footer.root_pos > 0 {
        check_node(db, footer.root_pos);
    }
}

fn check_node(db: &Database, pos: i64) {
    let node = Node::load(db.file(), pos).unwrap();
    for pair in node.items.windows(2) {
        assert!(
            pair[0].first_byte < pair[1].first_byte,
            "unsorted or duplicate child items"
        );
    }
    if node.leaf_pos > 0 {
        Leaf::load(db.file(), node.leaf_pos).unwrap();
    }
    for item in &node.items {
        let child = Node::load(db.file(), item.child_pos).unwrap();
        assert_eq!(child.prefix_bytes()[0], item.first_byte);
        check_node(db, item.child_pos);
    }
}
