//! Core primitives for the Strata account-state store.
//!
//! This crate holds the value types shared across the store engine and its
//! collaborators: addresses and digests, the `Account` value type, the
//! deterministic binary codec, cryptographic helpers, and the
//! transaction/receipt boundary types.
//!
//! Nothing in this crate holds locks or touches storage; everything here is
//! a plain value or a pure function over bytes.

pub mod account;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod transaction;
pub mod types;

pub use account::Account;
pub use error::CodecError;
pub use transaction::{Receipt, Transaction, TxPayload};
pub use types::{Address, Hash, ZERO_ADDRESS, ZERO_HASH};
