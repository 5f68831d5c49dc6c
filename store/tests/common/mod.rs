//! Shared test helpers for integration tests.
//!
//! Provides deterministic keypairs, transaction builders, and engine
//! factories used across the integration test files.

#![allow(dead_code)]

use std::sync::Arc;

use strata_primitives::transaction::sign_transaction;
use strata_primitives::{Account, Address, Transaction, TxPayload};
use strata_store::{
    AccountStore, MemContractStorage, MemKvStore, StoreConfig, TransferProcessor,
};

// ── Deterministic Keypairs ──

/// Create a deterministic Ed25519 signing key from a single seed byte.
///
/// The secret key is `[seed; 32]`, giving reproducible keys across machines.
pub fn deterministic_keypair(seed: u8) -> (ed25519_dalek::VerifyingKey, ed25519_dalek::SigningKey) {
    let secret_bytes = [seed; 32];
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&secret_bytes);
    let verifying_key = signing_key.verifying_key();
    (verifying_key, signing_key)
}

fn keyed_account(seed: u8) -> (Address, ed25519_dalek::SigningKey) {
    let (vk, sk) = deterministic_keypair(seed);
    (
        strata_primitives::crypto::address_from_public_key(vk.as_bytes()),
        sk,
    )
}

/// Alice: seed=1, stable address across all tests.
pub fn alice() -> (Address, ed25519_dalek::SigningKey) {
    keyed_account(1)
}

/// Bob: seed=2, stable address across all tests.
pub fn bob() -> (Address, ed25519_dalek::SigningKey) {
    keyed_account(2)
}

/// Charlie: seed=3, stable address across all tests.
pub fn charlie() -> (Address, ed25519_dalek::SigningKey) {
    keyed_account(3)
}

// ── Transaction Builders ──

/// Build a signed transfer transaction.
pub fn transfer_tx(
    nonce: u64,
    to: &Address,
    amount: u128,
    signing_key: &ed25519_dalek::SigningKey,
) -> Transaction {
    sign_transaction(
        nonce,
        TxPayload::Transfer { to: *to, amount },
        signing_key,
    )
}

/// Build a signed deployment transaction.
pub fn deploy_tx(nonce: u64, code: Vec<u8>, signing_key: &ed25519_dalek::SigningKey) -> Transaction {
    sign_transaction(nonce, TxPayload::Deploy { code }, signing_key)
}

// ── Engine Factories ──

/// Engine over a shared backing store, so a second engine can be pointed at
/// the same "disk".
pub fn engine_over(backend: Arc<MemKvStore>) -> AccountStore {
    AccountStore::new(
        backend,
        Arc::new(MemContractStorage::new()),
        TransferProcessor::new(),
        StoreConfig::default(),
    )
}

/// Fresh engine with its own in-memory collaborators.
pub fn fresh_engine() -> AccountStore {
    engine_over(Arc::new(MemKvStore::new()))
}

/// Fresh engine with the given accounts seeded into the primary store.
pub fn seeded_engine(accounts: &[(Address, u128)]) -> AccountStore {
    let engine = fresh_engine();
    for (addr, balance) in accounts {
        engine.add_account(*addr, Account::new(*balance, 0));
    }
    engine
}

/// Run one epoch: apply the transactions through the overlay and serialize
/// the resulting delta. Panics if any transaction is rejected.
pub fn run_epoch(engine: &AccountStore, epoch: u64, txs: &[Transaction]) {
    let mut receipt = strata_primitives::Receipt::default();
    for tx in txs {
        let applied = engine
            .update_accounts_temp(epoch, 1, false, tx, &mut receipt)
            .expect("transaction processing failed");
        assert!(applied, "transaction unexpectedly rejected");
    }
    engine.serialize_delta().expect("delta serialization failed");
}
