//! Contract-storage collaborator interface.
//!
//! The contract-storage subsystem persists contract bytecode and per-contract
//! key/value state. The engine only drives its lifecycle: staging code
//! batches during a disk flush, committing or reverting staged contract
//! state alongside account-state commits. Its internals are out of scope.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use strata_primitives::Address;

/// Interface the engine requires from the contract-storage subsystem.
pub trait ContractStorage: Send + Sync {
    /// Drop all contract code and state. Called for genesis or full resync.
    fn reset(&self);

    /// Clear the speculative contract-state layer for a new epoch.
    fn init_temp_state(&self);

    /// Clear the revert journal ahead of a revertible commit.
    fn init_revertibles(&self);

    /// Fetch the stored bytecode for an address; empty if absent.
    fn get_contract_code(&self, addr: &Address) -> Vec<u8>;

    /// Store a batch of contract-code entries. Returns `false` on failure.
    fn put_contract_code_batch(&self, batch: &BTreeMap<Address, Vec<u8>>) -> bool;

    /// Delete the stored bytecode for an address. Returns `false` on failure.
    fn delete_contract_code(&self, addr: &Address) -> bool;

    /// Commit staged contract state. Returns `false` on failure.
    fn commit_state(&self) -> bool;

    /// Undo contract-state changes staged since the last revertible commit.
    fn revert_contract_states(&self);
}

#[derive(Debug, Default)]
struct ContractData {
    /// Stored bytecode per contract address.
    code: BTreeMap<Address, Vec<u8>>,
    /// Committed contract key/value state.
    state: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Speculative contract state accumulated during the epoch.
    temp_state: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Committed state captured before the last revertible commit.
    prev_state: Option<BTreeMap<Vec<u8>, Vec<u8>>>,
}

/// In-memory contract storage, used in tests and as the reference
/// implementation of the collaborator interface.
#[derive(Debug, Default)]
pub struct MemContractStorage {
    inner: Mutex<ContractData>,
}

impl MemContractStorage {
    /// Create an empty contract store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a contract state entry into the speculative layer.
    pub fn put_temp_state(&self, key: Vec<u8>, value: Vec<u8>) {
        self.inner.lock().temp_state.insert(key, value);
    }

    /// Read a committed contract state entry.
    pub fn get_state(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.lock().state.get(key).cloned()
    }
}

impl ContractStorage for MemContractStorage {
    fn reset(&self) {
        *self.inner.lock() = ContractData::default();
    }

    fn init_temp_state(&self) {
        self.inner.lock().temp_state.clear();
    }

    fn init_revertibles(&self) {
        self.inner.lock().prev_state = None;
    }

    fn get_contract_code(&self, addr: &Address) -> Vec<u8> {
        self.inner.lock().code.get(addr).cloned().unwrap_or_default()
    }

    fn put_contract_code_batch(&self, batch: &BTreeMap<Address, Vec<u8>>) -> bool {
        let mut inner = self.inner.lock();
        for (addr, code) in batch {
            inner.code.insert(*addr, code.clone());
        }
        true
    }

    fn delete_contract_code(&self, addr: &Address) -> bool {
        self.inner.lock().code.remove(addr);
        true
    }

    fn commit_state(&self) -> bool {
        let mut inner = self.inner.lock();
        let staged = std::mem::take(&mut inner.temp_state);
        inner.prev_state = Some(inner.state.clone());
        for (key, value) in staged {
            inner.state.insert(key, value);
        }
        true
    }

    fn revert_contract_states(&self) {
        let mut inner = self.inner.lock();
        if let Some(prev) = inner.prev_state.take() {
            inner.state = prev;
        }
    }
}
