//! Backing key-value store abstraction.
//!
//! `KvStore` is the interface the engine requires from the disk engine: raw
//! puts and gets for trie leaves, prefix iteration for full reloads, and the
//! metadata slots that hold the persisted root digest. The disk engine's
//! internals (compaction, on-disk format) are not this crate's concern.
//!
//! Implementations:
//! - `MemKvStore` (this crate) — in-memory BTreeMap, used in tests and as
//!   the reference implementation
//! - a production backend is provided by the node's storage layer

use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Key prefix for metadata entries, keeping them apart from trie leaves.
const META_PREFIX: &[u8] = b"meta/";

/// Abstraction over the disk-resident key-value engine.
///
/// Implementations must be safe to share across threads; the engine holds
/// one handle and reaches it from several lock scopes.
pub trait KvStore: Send + Sync {
    /// Store a value. Returns `false` if the write could not be performed.
    fn put(&self, key: &[u8], value: &[u8]) -> bool;

    /// Fetch a value. Returns `None` if the key does not exist.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Delete a key. Returns `false` if the delete could not be performed.
    fn delete(&self, key: &[u8]) -> bool;

    /// All `(key, value)` pairs whose key starts with `prefix`, in key order.
    fn iter_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;

    /// Persist a metadata entry under a well-known name.
    fn put_metadata(&self, name: &[u8], value: &[u8]) -> bool {
        let mut key = META_PREFIX.to_vec();
        key.extend_from_slice(name);
        self.put(&key, value)
    }

    /// Fetch a metadata entry by name.
    fn get_metadata(&self, name: &[u8]) -> Option<Vec<u8>> {
        let mut key = META_PREFIX.to_vec();
        key.extend_from_slice(name);
        self.get(&key)
    }

    /// Delete a metadata entry by name.
    fn delete_metadata(&self, name: &[u8]) -> bool {
        let mut key = META_PREFIX.to_vec();
        key.extend_from_slice(name);
        self.delete(&key)
    }
}

/// In-memory key-value store backed by `BTreeMap`.
///
/// BTreeMap is used instead of HashMap for deterministic iteration order.
#[derive(Debug, Default)]
pub struct MemKvStore {
    data: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemKvStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries in the store.
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

impl KvStore for MemKvStore {
    fn put(&self, key: &[u8], value: &[u8]) -> bool {
        self.data.lock().insert(key.to_vec(), value.to_vec());
        true
    }

    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.lock().get(key).cloned()
    }

    fn delete(&self, key: &[u8]) -> bool {
        self.data.lock().remove(key);
        true
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.data
            .lock()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store() {
        let store = MemKvStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get(b"missing"), None);
    }

    #[test]
    fn test_put_and_get() {
        let store = MemKvStore::new();
        assert!(store.put(b"key1", b"value1"));
        assert_eq!(store.get(b"key1"), Some(b"value1".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_overwrite() {
        let store = MemKvStore::new();
        store.put(b"key1", b"v1");
        store.put(b"key1", b"v2");
        assert_eq!(store.get(b"key1"), Some(b"v2".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete() {
        let store = MemKvStore::new();
        store.put(b"key1", b"value1");
        assert!(store.delete(b"key1"));
        assert_eq!(store.get(b"key1"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_iter_prefix() {
        let store = MemKvStore::new();
        store.put(b"acct/a", b"1");
        store.put(b"acct/b", b"2");
        store.put(b"meta/root", b"3");

        let leaves = store.iter_prefix(b"acct/");
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].0, b"acct/a");
        assert_eq!(leaves[1].0, b"acct/b");
    }

    #[test]
    fn test_iter_prefix_empty() {
        let store = MemKvStore::new();
        store.put(b"other", b"1");
        assert!(store.iter_prefix(b"acct/").is_empty());
    }

    #[test]
    fn test_metadata_separate_namespace() {
        let store = MemKvStore::new();
        assert!(store.put_metadata(b"state_root", &[0xAA; 32]));
        assert_eq!(store.get_metadata(b"state_root"), Some(vec![0xAA; 32]));
        // Raw key space does not collide with the metadata name
        assert_eq!(store.get(b"state_root"), None);
    }
}
