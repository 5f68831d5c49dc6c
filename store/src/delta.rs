//! Delta and snapshot wire formats.
//!
//! A delta is the serialized write-set of the temp overlay relative to the
//! primary store: every overlay account whose state differs from the primary
//! view, in address order. An epoch that changed nothing serializes to a
//! zero entry count (four zero bytes), which the engine's delta hash maps
//! to the distinguished empty digest.
//!
//! Wire format (little-endian):
//!
//! ```text
//! [count: 4 bytes LE]
//! count × ( [address: 20 bytes] [account: var_bytes] )
//! ```
//!
//! The full-store snapshot uses the same entry layout over every account in
//! the store.

use strata_primitives::codec::{decode_account, encode_account, write_address, write_u32, write_var_bytes, Reader};
use strata_primitives::{Account, Address};

use crate::error::StoreError;
use crate::overlay::TempOverlay;
use crate::primary::PrimaryStore;
use crate::revertible::RevertibleSet;

/// Serialize the overlay-vs-primary difference.
///
/// Must be called with the delta lock and a primary-state read acquisition
/// held, so the diff never observes a torn primary view.
pub fn serialize_store_delta(temp: &TempOverlay, primary: &PrimaryStore) -> Vec<u8> {
    let mut entries: Vec<(&Address, &Account)> = Vec::new();
    for (addr, account) in temp.accounts() {
        let unchanged = primary
            .get_account(addr)
            .is_some_and(|existing| existing == *account);
        if !unchanged {
            entries.push((addr, account));
        }
    }

    let mut buf = Vec::with_capacity(4 + entries.len() * 80);
    write_u32(&mut buf, entries.len() as u32);
    for (addr, account) in entries {
        write_address(&mut buf, addr);
        write_var_bytes(&mut buf, &encode_account(account));
    }
    buf
}

/// Apply delta bytes onto the primary store's working set.
///
/// With `revertibles` present, the pre-commit value of every account that
/// will be overwritten, and the identity of every account that will be
/// created, is recorded *before* the account is mutated. That ordering is
/// what makes the commit exactly undoable; it must never be inverted.
pub fn apply_store_delta(
    bytes: &[u8],
    primary: &mut PrimaryStore,
    mut revertibles: Option<&mut RevertibleSet>,
) -> Result<(), StoreError> {
    let mut r = Reader::new(bytes);
    let count = r.read_u32()?;
    for _ in 0..count {
        let addr = r.read_address()?;
        let account = decode_account(&r.read_var_bytes()?)?;

        if let Some(set) = revertibles.as_deref_mut() {
            match primary.get_account(&addr) {
                Some(previous) => set.record_changed(addr, previous),
                None => set.record_created(addr),
            }
        }
        primary.put_account(addr, account);
    }
    Ok(())
}

/// Replay delta bytes into the temp overlay.
///
/// Used to reproduce a previously serialized delta (e.g. one received from
/// a peer) without re-executing its transactions.
pub fn apply_store_delta_temp(bytes: &[u8], temp: &mut TempOverlay) -> Result<(), StoreError> {
    let mut r = Reader::new(bytes);
    let count = r.read_u32()?;
    for _ in 0..count {
        let addr = r.read_address()?;
        let account = decode_account(&r.read_var_bytes()?)?;
        temp.insert(addr, account);
    }
    Ok(())
}

/// Serialize every account in the store (committed leaves overlaid with the
/// working set).
pub fn serialize_store(primary: &PrimaryStore) -> Vec<u8> {
    let all = primary.all_accounts();
    let mut buf = Vec::with_capacity(4 + all.len() * 80);
    write_u32(&mut buf, all.len() as u32);
    for (addr, account) in &all {
        write_address(&mut buf, addr);
        write_var_bytes(&mut buf, &encode_account(account));
    }
    buf
}

/// Populate the primary store from a full-store snapshot.
pub fn deserialize_store(bytes: &[u8], primary: &mut PrimaryStore) -> Result<(), StoreError> {
    let mut r = Reader::new(bytes);
    let count = r.read_u32()?;
    for _ in 0..count {
        let addr = r.read_address()?;
        let account = decode_account(&r.read_var_bytes()?)?;
        primary.put_account(addr, account);
    }
    Ok(())
}
