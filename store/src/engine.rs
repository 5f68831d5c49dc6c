//! The account-state store engine.
//!
//! [`AccountStore`] ties the four layers (primary store, temp overlay,
//! delta, revertible change set) together behind four locks, one per
//! resource group:
//!
//! 1. **delta** (`Mutex`): the temp overlay and the serialized delta bytes
//! 2. **primary** (`RwLock`): the working set, trie handle, and root
//!    digests; readers take a shared acquisition, mutators an exclusive one
//! 3. **revertibles** (`Mutex`): the changed/created maps
//! 4. **disk** (`Mutex`): the trie's pending on-disk transaction
//!
//! Lock order: **delta → primary → revertibles → disk**. Every operation
//! that needs more than one lock acquires them in this order and releases
//! them by scope on every exit path, so two threads can never hold the same
//! pair of locks in opposite order. Commit and revert on the same engine
//! must still be sequenced by the caller; the engine does not order
//! "commit of epoch N" against "overlay population of epoch N+1".
//!
//! Construct one engine at the process composition root and share it behind
//! an `Arc`; every method takes `&self`.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use strata_primitives::crypto::hash_sha256;
use strata_primitives::{Account, Address, Hash, Receipt, Transaction, ZERO_HASH};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::contracts::ContractStorage;
use crate::delta::{
    apply_store_delta, apply_store_delta_temp, deserialize_store, serialize_store,
    serialize_store_delta,
};
use crate::error::StoreError;
use crate::executor::{EpochContext, TransactionProcessor, TransferProcessor};
use crate::kv::KvStore;
use crate::overlay::TempOverlay;
use crate::primary::PrimaryStore;
use crate::revertible::RevertibleSet;

/// Temp overlay plus the delta bytes derived from it; one lock guards both.
#[derive(Default)]
struct TempState {
    overlay: TempOverlay,
    /// Last serialized delta. Zero-length until `serialize_delta` runs;
    /// a serialized no-op epoch is four zero bytes, which is distinct.
    delta: Vec<u8>,
}

/// The account-state store engine.
pub struct AccountStore<P: TransactionProcessor = TransferProcessor> {
    /// Delta lock: temp overlay + serialized delta bytes.
    temp: Mutex<TempState>,
    /// Primary-state lock: working set, trie, roots.
    primary: RwLock<PrimaryStore>,
    /// Revertible-set lock: changed/created maps.
    revertibles: Mutex<RevertibleSet>,
    /// Disk-persistence lock: the trie's pending on-disk transaction.
    disk: Mutex<()>,
    /// Contract-storage collaborator.
    contracts: Arc<dyn ContractStorage>,
    /// Transaction-execution collaborator.
    processor: P,
}

impl AccountStore<TransferProcessor> {
    /// Engine over in-memory collaborators with the default processor and
    /// configuration. Intended for tests and tools.
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(crate::kv::MemKvStore::new()),
            Arc::new(crate::contracts::MemContractStorage::new()),
            TransferProcessor::new(),
            StoreConfig::default(),
        )
    }
}

impl<P: TransactionProcessor> AccountStore<P> {
    /// Create an engine over the given collaborators.
    pub fn new(
        backend: Arc<dyn KvStore>,
        contracts: Arc<dyn ContractStorage>,
        processor: P,
        config: StoreConfig,
    ) -> Self {
        Self {
            temp: Mutex::new(TempState::default()),
            primary: RwLock::new(PrimaryStore::new(backend, &config)),
            revertibles: Mutex::new(RevertibleSet::new()),
            disk: Mutex::new(()),
            contracts,
            processor,
        }
    }

    // ── Lifecycle ──

    /// Full reset: in-memory layers, contract storage, and the persisted
    /// trie. Called for genesis or a full resync.
    pub fn init(&self) {
        debug!("resetting account store");
        self.init_soft();

        let mut primary = self.primary.write();
        let _disk = self.disk.lock();
        self.contracts.reset();
        primary.reset();
    }

    /// Reset the in-memory layers (working set, revertibles, temp overlay)
    /// without touching the on-disk trie. Used between epochs.
    pub fn init_soft(&self) {
        // Lock order: delta → primary → revertibles.
        let mut temp = self.temp.lock();
        let mut primary = self.primary.write();
        let mut revertibles = self.revertibles.lock();

        primary.clear_working_set();

        revertibles.clear();
        self.contracts.init_revertibles();

        temp.overlay.init();
        temp.delta.clear();
        self.contracts.init_temp_state();
    }

    /// Reset only the temp overlay and delta for a new epoch.
    pub fn init_temp(&self) {
        let mut temp = self.temp.lock();
        temp.overlay.init();
        temp.delta.clear();
        self.contracts.init_temp_state();
    }

    /// Reset only the revertible change set.
    pub fn init_revertibles(&self) {
        let mut revertibles = self.revertibles.lock();
        revertibles.clear();
        self.contracts.init_revertibles();
    }

    // ── Primary reads ──

    /// Look up an account in the primary store.
    pub fn get_account(&self, addr: &Address) -> Option<Account> {
        self.primary.read().get_account(addr)
    }

    /// Nonce of the account in the primary store, or 0 if absent.
    pub fn get_nonce(&self, addr: &Address) -> u64 {
        self.primary.read().get_nonce(addr)
    }

    /// Insert an account directly into the primary working set.
    ///
    /// Used to populate genesis state; epoch-time changes go through the
    /// overlay and delta instead.
    pub fn add_account(&self, addr: Address, account: Account) {
        self.primary.write().put_account(addr, account);
    }

    /// Root digest of the committed trie state.
    pub fn state_root(&self) -> Hash {
        self.primary.read().current_root()
    }

    // ── Overlay operations ──

    /// Apply one transaction speculatively into the temp overlay.
    ///
    /// Returns `Ok(false)`, with `receipt` left cleared, when the
    /// transaction is rejected by execution rules; `Err` only on internal
    /// failure.
    pub fn update_accounts_temp(
        &self,
        epoch: u64,
        shard_count: u32,
        is_committee: bool,
        tx: &Transaction,
        receipt: &mut Receipt,
    ) -> Result<bool, StoreError> {
        let mut temp = self.temp.lock();
        let primary = self.primary.read();
        let ctx = EpochContext {
            epoch,
            shard_count,
            is_committee,
        };
        self.processor
            .update_accounts(&ctx, tx, &mut temp.overlay, &primary, receipt)
    }

    /// Credit a reward to `rewardee` in the overlay, funded from `source`,
    /// creating the rewardee account if it does not exist yet.
    pub fn update_coinbase_temp(
        &self,
        rewardee: &Address,
        source: &Address,
        amount: u128,
    ) -> Result<(), StoreError> {
        let mut temp = self.temp.lock();
        let primary = self.primary.read();

        if temp.overlay.get_account(rewardee, &primary).is_none() {
            temp.overlay.add_account(*rewardee, Account::new(0, 0));
        }
        temp.overlay
            .transfer_balance(source, rewardee, amount, &primary)
    }

    /// Nonce as seen through the overlay: the overlay's value if the
    /// address was touched this epoch, else the primary store's.
    pub fn get_nonce_temp(&self, addr: &Address) -> u64 {
        let temp = self.temp.lock();
        let primary = self.primary.read();
        if temp.overlay.contains(addr) {
            temp.overlay.get_nonce(addr, &primary)
        } else {
            primary.get_nonce(addr)
        }
    }

    // ── Delta operations ──

    /// Compute and store the serialized overlay-vs-primary difference.
    pub fn serialize_delta(&self) -> Result<(), StoreError> {
        let mut temp = self.temp.lock();
        let primary = self.primary.read();
        let delta = serialize_store_delta(&temp.overlay, &primary);
        debug!(bytes = delta.len(), "serialized state delta");
        temp.delta = delta;
        Ok(())
    }

    /// A copy of the last serialized delta.
    pub fn get_serialized_delta(&self) -> Vec<u8> {
        self.temp.lock().delta.clone()
    }

    /// Digest of the last serialized delta.
    ///
    /// A delta whose bytes are entirely zero is semantically empty and
    /// yields the distinguished empty digest rather than the hash of its
    /// zero bytes.
    pub fn get_state_delta_hash(&self) -> Hash {
        let temp = self.temp.lock();
        if temp.delta.iter().all(|b| *b == 0) {
            return ZERO_HASH;
        }
        hash_sha256(&temp.delta)
    }

    /// Apply delta bytes onto the primary working set.
    ///
    /// With `revertible`, every account the delta touches is recorded into
    /// the revertible change set before it is mutated, arming a later
    /// [`revert_commit_temp`](Self::revert_commit_temp).
    pub fn deserialize_delta(&self, bytes: &[u8], revertible: bool) -> Result<(), StoreError> {
        if revertible {
            // Lock order: primary → revertibles.
            let mut primary = self.primary.write();
            let mut revertibles = self.revertibles.lock();
            apply_store_delta(bytes, &mut primary, Some(&mut revertibles))?;
            revertibles.arm();
        } else {
            let mut primary = self.primary.write();
            apply_store_delta(bytes, &mut primary, None)?;
        }
        Ok(())
    }

    /// Replay delta bytes into the temp overlay without re-executing
    /// transactions (e.g. a delta received from a peer).
    pub fn deserialize_delta_temp(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let mut temp = self.temp.lock();
        apply_store_delta_temp(bytes, &mut temp.overlay)
    }

    // ── Commit / revert protocol ──

    /// Destructively merge the current delta into the primary working set.
    /// There is no undo path for this commit.
    pub fn commit_temp(&self) -> Result<(), StoreError> {
        // Lock order: delta → primary.
        let temp = self.temp.lock();
        if temp.delta.is_empty() {
            return Err(StoreError::InconsistentState(
                "commit without a serialized delta".into(),
            ));
        }
        let mut primary = self.primary.write();
        apply_store_delta(&temp.delta, &mut primary, None)?;
        debug!("committed state delta");
        Ok(())
    }

    /// Merge the current delta into the primary working set, recording
    /// enough state to undo the merge exactly.
    pub fn commit_temp_revertible(&self) -> Result<(), StoreError> {
        // Lock order: delta → primary → revertibles.
        let temp = self.temp.lock();
        if temp.delta.is_empty() {
            return Err(StoreError::InconsistentState(
                "commit without a serialized delta".into(),
            ));
        }
        let mut primary = self.primary.write();
        let mut revertibles = self.revertibles.lock();

        revertibles.clear();
        self.contracts.init_revertibles();

        apply_store_delta(&temp.delta, &mut primary, Some(&mut revertibles))?;
        revertibles.arm();
        debug!(
            changed = revertibles.changed().len(),
            created = revertibles.created().len(),
            "revertibly committed state delta"
        );
        Ok(())
    }

    /// Undo the last revertible commit exactly.
    ///
    /// Restores every changed account to its recorded previous value and
    /// removes every created account, re-applying each through the trie
    /// staging path; contract-state changes are reverted alongside. Only
    /// valid after [`commit_temp_revertible`](Self::commit_temp_revertible);
    /// reverting a destructive commit is a programmer error and is
    /// rejected.
    pub fn revert_commit_temp(&self) -> Result<(), StoreError> {
        // Lock order: primary → revertibles.
        let mut primary = self.primary.write();
        let mut revertibles = self.revertibles.lock();

        if !revertibles.is_armed() {
            return Err(StoreError::InconsistentState(
                "revert without a revertible commit".into(),
            ));
        }

        for (addr, previous) in revertibles.changed() {
            primary.put_account(*addr, previous.clone());
        }
        for addr in revertibles.created() {
            primary.remove_account(addr);
        }
        self.contracts.revert_contract_states();

        debug!(
            changed = revertibles.changed().len(),
            created = revertibles.created().len(),
            "reverted state delta commit"
        );
        revertibles.clear();
        Ok(())
    }

    /// Addresses recorded as changed by the last revertible commit.
    pub fn revertible_changed(&self) -> Vec<Address> {
        self.revertibles.lock().changed().keys().copied().collect()
    }

    /// Addresses recorded as created by the last revertible commit.
    pub fn revertible_created(&self) -> Vec<Address> {
        self.revertibles.lock().created().iter().copied().collect()
    }

    // ── Disk persistence ──

    /// Commit staged state to disk and persist the new root digest.
    ///
    /// On failure the in-memory state is left as-is; the caller owns the
    /// retry-or-abort decision.
    pub fn move_updates_to_disk(&self) -> Result<(), StoreError> {
        // Lock order: primary → disk.
        let mut primary = self.primary.write();
        let _disk = self.disk.lock();
        primary.flush_to_disk(&*self.contracts)
    }

    /// Roll back the in-progress trie transaction and restore the last
    /// flushed root. Never fails observably.
    pub fn discard_unsaved_updates(&self) {
        // Lock order: primary → disk.
        let mut primary = self.primary.write();
        let _disk = self.disk.lock();
        primary.discard();
    }

    /// Reload state from disk after a restart.
    ///
    /// Returns `Ok(false)` when no prior state was ever persisted.
    pub fn retrieve_from_disk(&self) -> Result<bool, StoreError> {
        self.init_soft();

        // Lock order: primary → disk.
        let mut primary = self.primary.write();
        let _disk = self.disk.lock();
        match primary.load_from_disk() {
            Ok(found) => Ok(found),
            Err(err) => {
                warn!(error = %err, "failed to retrieve account state from disk");
                Err(err)
            }
        }
    }

    // ── Full-store snapshot ──

    /// Serialize every account in the store.
    pub fn serialize(&self) -> Vec<u8> {
        let primary = self.primary.read();
        serialize_store(&primary)
    }

    /// Replace the store contents with a full-store snapshot.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<(), StoreError> {
        self.init();
        let mut primary = self.primary.write();
        deserialize_store(bytes, &mut primary)
    }
}
