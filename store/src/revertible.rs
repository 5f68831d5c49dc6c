//! Revertible change set.
//!
//! Populated immediately before a revertible commit: the pre-commit value of
//! every account the delta will change, and the identity of every account it
//! will create. Consulting these two maps is sufficient to undo the commit
//! exactly. The `armed` flag distinguishes "a revertible commit happened"
//! from stale or never-populated state, so that a revert without a matching
//! commit can be rejected instead of silently corrupting the store.

use std::collections::{BTreeMap, BTreeSet};

use strata_primitives::{Account, Address};

/// Pre-commit snapshot enabling exact undo of one revertible commit.
#[derive(Debug, Default)]
pub struct RevertibleSet {
    /// Previous value of each account the commit overwrote.
    changed: BTreeMap<Address, Account>,
    /// Accounts the commit newly created.
    created: BTreeSet<Address>,
    /// Set once a revertible commit has populated this set.
    armed: bool,
}

impl RevertibleSet {
    /// Create an empty, unarmed set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all recorded state and disarm.
    pub fn clear(&mut self) {
        self.changed.clear();
        self.created.clear();
        self.armed = false;
    }

    /// Record the pre-commit value of an account about to be overwritten.
    ///
    /// The first recorded value wins; later records for the same address
    /// are ignored so the set always holds the true pre-commit state.
    pub fn record_changed(&mut self, addr: Address, previous: Account) {
        self.changed.entry(addr).or_insert(previous);
    }

    /// Record an account about to be newly created.
    pub fn record_created(&mut self, addr: Address) {
        if !self.changed.contains_key(&addr) {
            self.created.insert(addr);
        }
    }

    /// Mark the set as populated by a revertible commit.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Whether a revertible commit has populated this set.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Changed accounts with their pre-commit values, in address order.
    pub fn changed(&self) -> &BTreeMap<Address, Account> {
        &self.changed
    }

    /// Created-account identities, in address order.
    pub fn created(&self) -> &BTreeSet<Address> {
        &self.created
    }
}
