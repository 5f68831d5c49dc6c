//! The account value type.
//!
//! An `Account` is a plain value: the store engine copies accounts by value
//! into its maps and serializes them through the codec when they cross the
//! trie or delta boundary. Contract-ness is derived from the code field —
//! an account with empty code is a plain balance/nonce account.

use crate::crypto::hash_sha256;
use crate::types::{Address, Hash, ZERO_HASH};

/// Account state: balance, nonce, and optional contract data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Account {
    /// Token balance.
    pub balance: u128,
    /// Sequence number for replay protection.
    pub nonce: u64,
    /// Contract bytecode; empty for plain accounts.
    pub code: Vec<u8>,
    /// Root digest of the contract's own storage; `ZERO_HASH` when unused.
    pub storage_root: Hash,
}

impl Account {
    /// Create a plain account with the given balance and nonce.
    pub fn new(balance: u128, nonce: u64) -> Self {
        Self {
            balance,
            nonce,
            code: Vec::new(),
            storage_root: ZERO_HASH,
        }
    }

    /// Create a contract account with the given bytecode.
    pub fn contract(balance: u128, nonce: u64, code: Vec<u8>) -> Self {
        Self {
            balance,
            nonce,
            code,
            storage_root: ZERO_HASH,
        }
    }

    /// Returns true if this account carries contract bytecode.
    pub fn is_contract(&self) -> bool {
        !self.code.is_empty()
    }

    /// Increment the nonce, saturating at the maximum.
    pub fn increment_nonce(&mut self) {
        self.nonce = self.nonce.saturating_add(1);
    }
}

/// Derive the address of a contract created by `sender` at `nonce`.
///
/// The address is the last 20 bytes of SHA-256 over
/// `sender_address || nonce_le`.
pub fn contract_address(sender: &Address, nonce: u64) -> Address {
    let mut data = Vec::with_capacity(20 + 8);
    data.extend_from_slice(sender);
    data.extend_from_slice(&nonce.to_le_bytes());
    let digest = hash_sha256(&data);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest[12..]);
    addr
}
