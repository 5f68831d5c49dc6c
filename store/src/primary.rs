//! The primary (durable-view) account store.
//!
//! Owns the account trie, the current and previous root digests, and the
//! in-memory working set of accounts loaded or modified since the last disk
//! flush. Every address present in the working set reflects the most recent
//! uncommitted state for that address; addresses absent from it are read
//! through the trie.
//!
//! Locking is the engine's job — this type assumes the caller holds the
//! primary-state lock (shared for reads, exclusive for mutation) and the
//! disk-persistence lock for flush/discard/load.

use std::collections::BTreeMap;
use std::sync::Arc;

use strata_primitives::codec::{decode_account, encode_account};
use strata_primitives::types::bytes_to_hex;
use strata_primitives::{Account, Address, Hash, ZERO_HASH};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::contracts::ContractStorage;
use crate::error::StoreError;
use crate::kv::KvStore;
use crate::trie::AccountTrie;

/// Durable account view: trie, roots, and the dirty working set.
pub struct PrimaryStore {
    /// Accounts loaded or modified since the last flush.
    dirty: BTreeMap<Address, Account>,
    /// Trie-backed committed view.
    trie: AccountTrie,
    /// Disk engine handle for the persisted root digest.
    metadata: Arc<dyn KvStore>,
    /// Root captured at the last successful flush.
    prev_root: Hash,
    /// Metadata key holding the persisted root.
    root_key: Vec<u8>,
    /// Whether reloads verify the recomputed root.
    verify_root_on_load: bool,
}

impl PrimaryStore {
    /// Create an empty primary store over the given disk engine.
    pub fn new(backend: Arc<dyn KvStore>, config: &StoreConfig) -> Self {
        Self {
            dirty: BTreeMap::new(),
            trie: AccountTrie::new(backend.clone(), config.leaf_prefix.clone()),
            metadata: backend,
            prev_root: ZERO_HASH,
            root_key: config.root_key.clone(),
            verify_root_on_load: config.verify_root_on_load,
        }
    }

    /// Full reset: working set, trie (including persisted leaves), and the
    /// persisted root digest. Used for genesis or full resync.
    pub fn reset(&mut self) {
        self.dirty.clear();
        self.trie.reset();
        self.prev_root = ZERO_HASH;
        if !self.metadata.delete_metadata(&self.root_key) {
            warn!("failed to delete persisted state root during reset");
        }
    }

    /// Clear the working set and drop any staged trie writes, leaving the
    /// on-disk trie untouched. Used between epochs.
    pub fn clear_working_set(&mut self) {
        self.dirty.clear();
        self.trie.rollback();
    }

    /// Look up an account: working set first, then the trie.
    ///
    /// A leaf that fails to decode is logged and treated as absent.
    pub fn get_account(&self, addr: &Address) -> Option<Account> {
        if let Some(account) = self.dirty.get(addr) {
            return Some(account.clone());
        }
        let bytes = self.trie.get(addr)?;
        match decode_account(&bytes) {
            Ok(account) => Some(account),
            Err(err) => {
                warn!(
                    address = %bytes_to_hex(addr),
                    error = %err,
                    "failed to decode account leaf"
                );
                None
            }
        }
    }

    /// Nonce of the account, or 0 if absent.
    pub fn get_nonce(&self, addr: &Address) -> u64 {
        self.get_account(addr).map(|a| a.nonce).unwrap_or(0)
    }

    /// Write an account into the working set and stage the trie leaf.
    pub fn put_account(&mut self, addr: Address, account: Account) {
        self.trie.stage_put(addr, encode_account(&account));
        self.dirty.insert(addr, account);
    }

    /// Remove an account from the working set and stage the leaf removal.
    pub fn remove_account(&mut self, addr: &Address) {
        self.dirty.remove(addr);
        self.trie.stage_remove(*addr);
    }

    /// Root digest of the committed trie state.
    pub fn current_root(&self) -> Hash {
        self.trie.root()
    }

    /// Root captured at the last successful flush.
    pub fn previous_root(&self) -> Hash {
        self.prev_root
    }

    /// Number of accounts in the working set.
    pub fn working_set_len(&self) -> usize {
        self.dirty.len()
    }

    /// The working set, for flush staging and delta computation.
    pub fn working_set(&self) -> &BTreeMap<Address, Account> {
        &self.dirty
    }

    /// Merged view of every account: committed leaves overlaid with the
    /// working set. Leaves that fail to decode are skipped.
    pub fn all_accounts(&self) -> BTreeMap<Address, Account> {
        let mut merged = BTreeMap::new();
        for (addr, bytes) in self.trie.iter() {
            match decode_account(bytes) {
                Ok(account) => {
                    merged.insert(*addr, account);
                }
                Err(err) => {
                    warn!(
                        address = %bytes_to_hex(addr),
                        error = %err,
                        "skipping undecodable account leaf"
                    );
                }
            }
        }
        for (addr, account) in &self.dirty {
            merged.insert(*addr, account.clone());
        }
        merged
    }

    /// Flush staged state to disk.
    ///
    /// Stages contract code for dirty contract accounts whose code is not
    /// yet stored, commits the code batch and the contract state, commits
    /// the trie transaction, and persists the new root. On any failure the
    /// working set is left unchanged and the caller decides retry vs.
    /// abort; a contract-state failure deletes the just-written code batch
    /// so the old state remains valid.
    pub fn flush_to_disk(&mut self, contracts: &dyn ContractStorage) -> Result<(), StoreError> {
        let mut code_batch: BTreeMap<Address, Vec<u8>> = BTreeMap::new();
        for (addr, account) in &self.dirty {
            if account.is_contract() && contracts.get_contract_code(addr).is_empty() {
                code_batch.insert(*addr, account.code.clone());
            }
        }

        if !contracts.put_contract_code_batch(&code_batch) {
            warn!("contract code batch write failed");
            return Err(StoreError::Persistence(
                "contract code batch write failed".into(),
            ));
        }

        if !contracts.commit_state() {
            warn!("contract state commit failed, deleting staged contract code");
            for addr in code_batch.keys() {
                if !contracts.delete_contract_code(addr) {
                    warn!(
                        address = %bytes_to_hex(addr),
                        "failed to delete contract code"
                    );
                }
            }
            return Err(StoreError::Persistence(
                "contract state commit failed".into(),
            ));
        }

        let new_root = self.trie.commit()?;
        if !self.metadata.put_metadata(&self.root_key, &new_root) {
            warn!("failed to persist state root");
        }
        self.prev_root = new_root;
        self.dirty.clear();
        debug!(root = %bytes_to_hex(&new_root), "flushed account state to disk");
        Ok(())
    }

    /// Roll back the in-progress trie transaction, restore the root to the
    /// last flushed root, and clear the working set. Never fails observably.
    pub fn discard(&mut self) {
        self.trie.rollback();
        self.trie.set_root(self.prev_root);
        self.dirty.clear();
        debug!(root = %bytes_to_hex(&self.prev_root), "discarded unsaved account state");
    }

    /// Reload state from disk.
    ///
    /// Returns `Ok(false)` if no root digest has ever been persisted.
    /// Otherwise rebuilds the trie's leaf set from the backing store and
    /// populates the working set from it, skipping leaves that fail to
    /// decode.
    pub fn load_from_disk(&mut self) -> Result<bool, StoreError> {
        let Some(root_bytes) = self.metadata.get_metadata(&self.root_key) else {
            return Ok(false);
        };
        if root_bytes.len() != 32 {
            return Err(StoreError::Persistence(
                "malformed persisted root digest".into(),
            ));
        }
        let mut root = ZERO_HASH;
        root.copy_from_slice(&root_bytes);

        self.trie.set_root(root);
        self.trie.load(self.verify_root_on_load)?;

        let mut loaded = BTreeMap::new();
        for (addr, bytes) in self.trie.iter() {
            match decode_account(bytes) {
                Ok(account) => {
                    loaded.insert(*addr, account);
                }
                Err(err) => {
                    warn!(
                        address = %bytes_to_hex(addr),
                        error = %err,
                        "skipping undecodable account leaf during reload"
                    );
                }
            }
        }
        self.dirty = loaded;
        self.prev_root = self.trie.root();
        debug!(
            root = %bytes_to_hex(&self.prev_root),
            accounts = self.dirty.len(),
            "reloaded account state from disk"
        );
        Ok(true)
    }
}
