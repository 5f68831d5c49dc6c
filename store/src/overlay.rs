//! Speculative account overlay.
//!
//! The overlay holds the effects of in-flight transaction execution for one
//! epoch. Reads check the overlay first and fall through to the primary
//! store for untouched addresses; writes stay local. The overlay is never
//! persisted directly (its effects reach the primary store only through
//! delta application) and is reset at the start of each epoch.

use std::collections::BTreeMap;

use strata_primitives::{Account, Address};

use crate::error::StoreError;
use crate::primary::PrimaryStore;

/// Transient address → account map layered over the primary store.
#[derive(Debug, Default)]
pub struct TempOverlay {
    accounts: BTreeMap<Address, Account>,
}

impl TempOverlay {
    /// Create an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all overlay entries.
    pub fn init(&mut self) {
        self.accounts.clear();
    }

    /// Look up an account: overlay first, then the primary store.
    pub fn get_account(&self, addr: &Address, primary: &PrimaryStore) -> Option<Account> {
        if let Some(account) = self.accounts.get(addr) {
            return Some(account.clone());
        }
        primary.get_account(addr)
    }

    /// Returns true if the overlay has an entry for this address.
    pub fn contains(&self, addr: &Address) -> bool {
        self.accounts.contains_key(addr)
    }

    /// Insert an account into the overlay, replacing any prior entry.
    pub fn insert(&mut self, addr: Address, account: Account) {
        self.accounts.insert(addr, account);
    }

    /// Create an account in the overlay if no entry exists yet.
    pub fn add_account(&mut self, addr: Address, account: Account) {
        self.accounts.entry(addr).or_insert(account);
    }

    /// Nonce visible through the overlay, or 0 if the account is absent.
    pub fn get_nonce(&self, addr: &Address, primary: &PrimaryStore) -> u64 {
        self.get_account(addr, primary)
            .map(|a| a.nonce)
            .unwrap_or(0)
    }

    /// Move `amount` from `from` to `to`, creating `to` if absent.
    ///
    /// Fails with [`StoreError::InsufficientFunds`] when the sender balance
    /// is too small; the overlay is unchanged in that case.
    pub fn transfer_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u128,
        primary: &PrimaryStore,
    ) -> Result<(), StoreError> {
        let mut sender = self.get_account(from, primary).unwrap_or_default();
        if sender.balance < amount {
            return Err(StoreError::InsufficientFunds {
                balance: sender.balance,
                required: amount,
            });
        }

        let mut recipient = self.get_account(to, primary).unwrap_or_default();
        sender.balance -= amount;
        recipient.balance = recipient.balance.saturating_add(amount);

        self.accounts.insert(*from, sender);
        self.accounts.insert(*to, recipient);
        Ok(())
    }

    /// The overlay's own entries, in address order.
    pub fn accounts(&self) -> &BTreeMap<Address, Account> {
        &self.accounts
    }

    /// Number of addresses touched in this epoch.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if no address has been touched.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
