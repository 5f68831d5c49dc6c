//! Transaction-execution collaborator interface.
//!
//! The engine does not interpret transactions itself; it hands them to a
//! [`TransactionProcessor`] together with the temp overlay and the primary
//! store for fallback reads. A processor returns `Ok(false)` for
//! transactions rejected by execution rules (a result, not an error) and
//! reserves `Err` for internal failures.
//!
//! [`TransferProcessor`] is the built-in processor covering plain value
//! transfers and contract deployment; richer interpreters plug in through
//! the same trait.

use strata_primitives::account::contract_address;
use strata_primitives::crypto::verify_ed25519;
use strata_primitives::types::bytes_to_hex;
use strata_primitives::{Account, Receipt, Transaction, TxPayload};
use tracing::debug;

use crate::error::StoreError;
use crate::overlay::TempOverlay;
use crate::primary::PrimaryStore;

/// Flat gas charge for a value transfer.
const GAS_TRANSFER: u64 = 10;
/// Flat gas charge for a contract deployment.
const GAS_DEPLOY: u64 = 50;

/// Execution context for one epoch.
#[derive(Debug, Clone, Copy)]
pub struct EpochContext {
    /// Epoch (block) number being executed.
    pub epoch: u64,
    /// Number of shards in the current topology.
    pub shard_count: u32,
    /// Whether this node executes as a committee member.
    pub is_committee: bool,
}

/// Interface the engine requires from the transaction interpreter.
pub trait TransactionProcessor: Send + Sync {
    /// Apply one transaction's effects into the overlay.
    ///
    /// Returns `Ok(true)` and populates `receipt` when the transaction was
    /// applied; `Ok(false)` with a cleared receipt when it was rejected by
    /// execution rules; `Err` only on internal failure.
    fn update_accounts(
        &self,
        ctx: &EpochContext,
        tx: &Transaction,
        temp: &mut TempOverlay,
        primary: &PrimaryStore,
        receipt: &mut Receipt,
    ) -> Result<bool, StoreError>;
}

/// Built-in processor for transfers and contract deployment.
#[derive(Debug, Default)]
pub struct TransferProcessor;

impl TransferProcessor {
    /// Create a new processor.
    pub fn new() -> Self {
        Self
    }
}

impl TransactionProcessor for TransferProcessor {
    fn update_accounts(
        &self,
        ctx: &EpochContext,
        tx: &Transaction,
        temp: &mut TempOverlay,
        primary: &PrimaryStore,
        receipt: &mut Receipt,
    ) -> Result<bool, StoreError> {
        receipt.clear();

        if !verify_ed25519(&tx.signed_data(), &tx.signature, &tx.public_key) {
            debug!("rejecting transaction with invalid signature");
            return Ok(false);
        }

        let sender = tx.sender();
        let current_nonce = temp.get_nonce(&sender, primary);
        if tx.nonce != current_nonce {
            debug!(
                sender = %bytes_to_hex(&sender),
                expected = current_nonce,
                got = tx.nonce,
                "rejecting transaction with nonce mismatch"
            );
            return Ok(false);
        }

        let gas_used = match &tx.payload {
            TxPayload::Transfer { to, amount } => {
                match temp.transfer_balance(&sender, to, *amount, primary) {
                    Ok(()) => {}
                    Err(StoreError::InsufficientFunds { balance, required }) => {
                        debug!(
                            sender = %bytes_to_hex(&sender),
                            balance,
                            required,
                            "rejecting transfer with insufficient funds"
                        );
                        return Ok(false);
                    }
                    Err(err) => return Err(err),
                }
                GAS_TRANSFER
            }
            TxPayload::Deploy { code } => {
                if code.is_empty() {
                    debug!("rejecting deployment with empty code");
                    return Ok(false);
                }
                let addr = contract_address(&sender, tx.nonce);
                if temp.get_account(&addr, primary).is_some() {
                    debug!(
                        address = %bytes_to_hex(&addr),
                        "rejecting deployment to occupied address"
                    );
                    return Ok(false);
                }
                temp.insert(addr, Account::contract(0, 0, code.clone()));
                GAS_DEPLOY
            }
        };

        let mut sender_account = temp.get_account(&sender, primary).unwrap_or_default();
        sender_account.increment_nonce();
        temp.insert(sender, sender_account);

        receipt.success = true;
        receipt.epoch = ctx.epoch;
        receipt.gas_used = gas_used;
        debug!(
            epoch = ctx.epoch,
            shard_count = ctx.shard_count,
            is_committee = ctx.is_committee,
            sender = %bytes_to_hex(&sender),
            gas_used,
            "applied transaction to overlay"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::kv::MemKvStore;
    use std::sync::Arc;
    use strata_primitives::crypto::generate_keypair;
    use strata_primitives::transaction::sign_transaction;

    fn ctx() -> EpochContext {
        EpochContext {
            epoch: 1,
            shard_count: 1,
            is_committee: false,
        }
    }

    fn funded_primary(addr: strata_primitives::Address, balance: u128) -> PrimaryStore {
        let mut primary =
            PrimaryStore::new(Arc::new(MemKvStore::new()), &StoreConfig::default());
        primary.put_account(addr, Account::new(balance, 0));
        primary
    }

    #[test]
    fn test_valid_transfer() {
        let (_vk, sk) = generate_keypair();
        let tx = sign_transaction(
            0,
            TxPayload::Transfer {
                to: [2u8; 20],
                amount: 1000,
            },
            &sk,
        );
        let sender = tx.sender();
        let primary = funded_primary(sender, 5000);
        let mut temp = TempOverlay::new();
        let mut receipt = Receipt::default();

        let applied = TransferProcessor::new()
            .update_accounts(&ctx(), &tx, &mut temp, &primary, &mut receipt)
            .unwrap();

        assert!(applied);
        assert!(receipt.success);
        assert_eq!(receipt.epoch, 1);
        assert_eq!(temp.get_account(&sender, &primary).unwrap().balance, 4000);
        assert_eq!(temp.get_account(&sender, &primary).unwrap().nonce, 1);
        assert_eq!(temp.get_account(&[2u8; 20], &primary).unwrap().balance, 1000);
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let (_vk, sk) = generate_keypair();
        let mut tx = sign_transaction(
            0,
            TxPayload::Transfer {
                to: [2u8; 20],
                amount: 1,
            },
            &sk,
        );
        tx.signature = [0u8; 64];
        let sender = tx.sender();
        let primary = funded_primary(sender, 100);
        let mut temp = TempOverlay::new();
        let mut receipt = Receipt::default();

        let applied = TransferProcessor::new()
            .update_accounts(&ctx(), &tx, &mut temp, &primary, &mut receipt)
            .unwrap();

        assert!(!applied);
        assert_eq!(receipt, Receipt::default());
        assert!(temp.is_empty());
    }

    #[test]
    fn test_nonce_mismatch_rejected() {
        let (_vk, sk) = generate_keypair();
        let tx = sign_transaction(
            5,
            TxPayload::Transfer {
                to: [2u8; 20],
                amount: 1,
            },
            &sk,
        );
        let sender = tx.sender();
        let primary = funded_primary(sender, 100);
        let mut temp = TempOverlay::new();
        let mut receipt = Receipt::default();

        let applied = TransferProcessor::new()
            .update_accounts(&ctx(), &tx, &mut temp, &primary, &mut receipt)
            .unwrap();
        assert!(!applied);
    }

    #[test]
    fn test_insufficient_funds_rejected_not_error() {
        let (_vk, sk) = generate_keypair();
        let tx = sign_transaction(
            0,
            TxPayload::Transfer {
                to: [2u8; 20],
                amount: 1000,
            },
            &sk,
        );
        let sender = tx.sender();
        let primary = funded_primary(sender, 10);
        let mut temp = TempOverlay::new();
        let mut receipt = Receipt::default();

        let result = TransferProcessor::new()
            .update_accounts(&ctx(), &tx, &mut temp, &primary, &mut receipt);
        assert_eq!(result, Ok(false));
        assert!(!receipt.success);
    }

    #[test]
    fn test_sequential_nonces() {
        let (_vk, sk) = generate_keypair();
        let sender_tx0 = sign_transaction(
            0,
            TxPayload::Transfer {
                to: [2u8; 20],
                amount: 100,
            },
            &sk,
        );
        let sender_tx1 = sign_transaction(
            1,
            TxPayload::Transfer {
                to: [2u8; 20],
                amount: 200,
            },
            &sk,
        );
        let sender = sender_tx0.sender();
        let primary = funded_primary(sender, 10_000);
        let mut temp = TempOverlay::new();
        let mut receipt = Receipt::default();
        let processor = TransferProcessor::new();

        assert!(processor
            .update_accounts(&ctx(), &sender_tx0, &mut temp, &primary, &mut receipt)
            .unwrap());
        assert!(processor
            .update_accounts(&ctx(), &sender_tx1, &mut temp, &primary, &mut receipt)
            .unwrap());

        assert_eq!(temp.get_account(&sender, &primary).unwrap().balance, 9700);
        assert_eq!(temp.get_account(&sender, &primary).unwrap().nonce, 2);
        assert_eq!(temp.get_account(&[2u8; 20], &primary).unwrap().balance, 300);
    }

    #[test]
    fn test_deploy_creates_contract_account() {
        let (_vk, sk) = generate_keypair();
        let tx = sign_transaction(0, TxPayload::Deploy { code: vec![0x60, 0x80] }, &sk);
        let sender = tx.sender();
        let primary = funded_primary(sender, 100);
        let mut temp = TempOverlay::new();
        let mut receipt = Receipt::default();

        let applied = TransferProcessor::new()
            .update_accounts(&ctx(), &tx, &mut temp, &primary, &mut receipt)
            .unwrap();
        assert!(applied);

        let addr = contract_address(&sender, 0);
        let contract = temp.get_account(&addr, &primary).unwrap();
        assert!(contract.is_contract());
        assert_eq!(contract.code, vec![0x60, 0x80]);
        assert_eq!(temp.get_account(&sender, &primary).unwrap().nonce, 1);
    }

    #[test]
    fn test_deploy_empty_code_rejected() {
        let (_vk, sk) = generate_keypair();
        let tx = sign_transaction(0, TxPayload::Deploy { code: vec![] }, &sk);
        let sender = tx.sender();
        let primary = funded_primary(sender, 100);
        let mut temp = TempOverlay::new();
        let mut receipt = Receipt::default();

        let applied = TransferProcessor::new()
            .update_accounts(&ctx(), &tx, &mut temp, &primary, &mut receipt)
            .unwrap();
        assert!(!applied);
    }
}
