//! Store configuration.

/// Configuration for an [`AccountStore`](crate::AccountStore) instance.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Metadata key under which the current trie root digest is persisted.
    pub root_key: Vec<u8>,

    /// Key prefix for trie leaves in the backing key-value store.
    pub leaf_prefix: Vec<u8>,

    /// Verify the recomputed trie root against the persisted root when
    /// reloading state from disk.
    pub verify_root_on_load: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_key: b"state_root".to_vec(),
            leaf_prefix: b"acct/".to_vec(),
            verify_root_on_load: true,
        }
    }
}
