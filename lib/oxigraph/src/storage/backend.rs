//! A minimal, single-keyspace key-value engine.
//!
//! Keys are opaque bytes; callers partition the keyspace themselves by prefixing every key with
//! a one-byte [`Table`] discriminant, so eleven logical tables share one ordered map while
//! lexicographic byte order stays the only ordering this engine needs to get right.
//!
//! Modeled on [`MemoryStorage`](../../../oxigraph/src/storage/memory.rs)'s
//! snapshot-for-reads/single-writer-transaction split, simplified to a flat `BTreeMap` instead of
//! per-quad MVCC version ranges: a reader clones the `Arc` pointer to the current map (cheap,
//! lock-free after that point) and a writer clones the map itself, mutates its own copy, and
//! swaps the pointer in on commit.

use crate::storage::error::StorageError;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, Mutex};

/// One of the eleven fixed tables the quad store partitions its keyspace into.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(u8)]
pub enum Table {
    Id2Str = 0,
    Spo = 1,
    Pos = 2,
    Osp = 3,
    Spog = 4,
    Posg = 5,
    Ospg = 6,
    Gspo = 7,
    Gpos = 8,
    Gosp = 9,
    Graphs = 10,
}

impl Table {
    fn prefix(self) -> u8 {
        self as u8
    }
}

fn table_key(table: Table, key: &[u8]) -> Vec<u8> {
    let mut full = Vec::with_capacity(key.len() + 1);
    full.push(table.prefix());
    full.extend_from_slice(key);
    full
}

fn table_bounds(table: Table) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let start = vec![table.prefix()];
    match table.prefix().checked_add(1) {
        Some(next) => (Bound::Included(start), Bound::Excluded(vec![next])),
        None => (Bound::Included(start), Bound::Unbounded),
    }
}

/// The backing store: an `Arc`-swapped snapshot of the whole keyspace.
#[derive(Default)]
pub struct StorageBackend {
    current: Mutex<Arc<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl StorageBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A read-only, point-in-time view of every table.
    pub fn reader(&self) -> Reader {
        Reader {
            snapshot: Arc::clone(&self.current.lock().unwrap()),
        }
    }

    /// A read-write transaction. Only one writer is ever live at a time in this engine: callers
    /// serialize writes by holding the returned [`Writer`] until `commit` or `rollback`.
    pub fn writer(&self) -> Writer<'_> {
        let snapshot = Arc::clone(&self.current.lock().unwrap());
        Writer {
            backend: self,
            base: Arc::clone(&snapshot),
            pending: (*snapshot).clone(),
        }
    }
}

/// A read-only snapshot of the keyspace, stable for the lifetime of the handle even if a
/// concurrent writer commits.
pub struct Reader {
    snapshot: Arc<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl Reader {
    pub fn get(&self, table: Table, key: &[u8]) -> Option<&[u8]> {
        self.snapshot.get(&table_key(table, key)).map(Vec::as_slice)
    }

    pub fn contains_key(&self, table: Table, key: &[u8]) -> bool {
        self.snapshot.contains_key(&table_key(table, key))
    }

    /// Iterates every `(key, value)` pair in `table` in ascending lexicographic key order, with
    /// the table's own prefix byte stripped off the returned key.
    pub fn scan(&self, table: Table) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        let (start, end) = table_bounds(table);
        self.snapshot
            .range((start, end))
            .map(move |(k, v)| (&k[1..], v.as_slice()))
    }

    /// Iterates every `(key, value)` pair whose key starts with `prefix`, within `table`, in
    /// ascending order, with the table byte stripped.
    pub fn scan_prefix<'a>(
        &'a self,
        table: Table,
        prefix: &'a [u8],
    ) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        let full_prefix = table_key(table, prefix);
        let start = Bound::Included(full_prefix.clone());
        let end = match increment(&full_prefix) {
            Some(next) => Bound::Excluded(next),
            None => Bound::Unbounded,
        };
        self.snapshot
            .range::<Vec<u8>, _>((start, end))
            .map(move |(k, v)| (&k[1..], v.as_slice()))
    }
}

/// Increments a byte string as if it were a big-endian integer, for use as an exclusive scan
/// upper bound; `None` if every byte is already `0xff` (the scan is then unbounded above).
fn increment(bytes: &[u8]) -> Option<Vec<u8>> {
    let mut next = bytes.to_vec();
    for byte in next.iter_mut().rev() {
        if *byte == u8::MAX {
            *byte = 0;
        } else {
            *byte += 1;
            return Some(next);
        }
    }
    None
}

/// A read-write transaction. Reads see this transaction's own uncommitted writes; nothing is
/// visible to other readers until [`Writer::commit`].
pub struct Writer<'a> {
    backend: &'a StorageBackend,
    base: Arc<BTreeMap<Vec<u8>, Vec<u8>>>,
    pending: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Writer<'_> {
    pub fn get(&self, table: Table, key: &[u8]) -> Option<&[u8]> {
        self.pending.get(&table_key(table, key)).map(Vec::as_slice)
    }

    pub fn contains_key(&self, table: Table, key: &[u8]) -> bool {
        self.pending.contains_key(&table_key(table, key))
    }

    pub fn insert(&mut self, table: Table, key: &[u8], value: &[u8]) {
        self.pending.insert(table_key(table, key), value.to_vec());
    }

    /// Removes `key`; returns `true` if it was present.
    pub fn remove(&mut self, table: Table, key: &[u8]) -> bool {
        self.pending.remove(&table_key(table, key)).is_some()
    }

    pub fn scan(&self, table: Table) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        let (start, end) = table_bounds(table);
        self.pending
            .range((start, end))
            .map(move |(k, v)| (&k[1..], v.as_slice()))
    }

    /// Atomically publishes every write made through this handle so subsequent [`Reader`]s and
    /// [`Writer`]s observe them. Fails only if another commit slipped in between this
    /// transaction's start and its commit, which this single-writer engine never produces, but
    /// the fallible signature keeps callers honest about what a real MVCC backend can do.
    pub fn commit(self) -> Result<(), StorageError> {
        let mut current = self.backend.current.lock().unwrap();
        if !Arc::ptr_eq(&current, &self.base) {
            return Err(StorageError::Corruption(
                crate::storage::error::CorruptionError::msg(
                    "a concurrent writer committed before this transaction",
                ),
            ));
        }
        *current = Arc::new(self.pending);
        Ok(())
    }

    /// Discards every write made through this handle.
    pub fn rollback(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_invisible_until_commit() {
        let backend = StorageBackend::new();
        let mut writer = backend.writer();
        writer.insert(Table::Spo, b"k", b"v");
        assert!(writer.contains_key(Table::Spo, b"k"));
        assert!(!backend.reader().contains_key(Table::Spo, b"k"));
        writer.commit().unwrap();
        assert!(backend.reader().contains_key(Table::Spo, b"k"));
    }

    #[test]
    fn rollback_discards_pending_writes() {
        let backend = StorageBackend::new();
        let mut writer = backend.writer();
        writer.insert(Table::Spo, b"k", b"v");
        writer.rollback();
        assert!(!backend.reader().contains_key(Table::Spo, b"k"));
    }

    #[test]
    fn scan_prefix_is_scoped_to_its_table_and_prefix() {
        let backend = StorageBackend::new();
        let mut writer = backend.writer();
        writer.insert(Table::Spo, b"ab", b"1");
        writer.insert(Table::Spo, b"ac", b"2");
        writer.insert(Table::Pos, b"ab", b"should not appear");
        writer.commit().unwrap();
        let reader = backend.reader();
        let found: Vec<_> = reader.scan_prefix(Table::Spo, b"a").map(|(k, _)| k.to_vec()).collect();
        assert_eq!(found, vec![b"ab".to_vec(), b"ac".to_vec()]);
    }

    #[test]
    fn increment_carries_through_trailing_max_bytes() {
        assert_eq!(increment(&[0x01, 0xff]), Some(vec![0x02, 0x00]));
        assert_eq!(increment(&[0xff, 0xff]), None);
    }
}
