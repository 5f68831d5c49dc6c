//! Layered account-state store engine.
//!
//! The engine maintains the authoritative address → account mapping of a
//! chain node across four layers:
//!
//! - **Primary store** — the durable view: a trie-backed account map plus an
//!   in-memory working set of accounts changed since the last disk flush.
//! - **Temp overlay** — a transient map used to speculatively apply a batch
//!   of transactions without touching the primary store; reads fall through
//!   to the primary store for untouched addresses.
//! - **Delta tracker** — the serialized overlay-vs-primary difference and
//!   its digest, used as a consensus artifact.
//! - **Revertible change set** — pre-commit values and created-account
//!   identities recorded by a revertible commit, enabling exact undo.
//!
//! One epoch flows: reset the overlay → apply transactions → serialize the
//! delta → commit it into the primary working set (destructively or
//! revertibly) → flush the trie to disk, or discard.
//!
//! [`AccountStore`] is the engine entry point; construct one per process at
//! the composition root and share it behind an `Arc`.

pub mod config;
pub mod contracts;
pub mod delta;
pub mod engine;
pub mod error;
pub mod executor;
pub mod kv;
pub mod overlay;
pub mod primary;
pub mod revertible;
pub mod trie;

pub use config::StoreConfig;
pub use contracts::{ContractStorage, MemContractStorage};
pub use engine::AccountStore;
pub use error::StoreError;
pub use executor::{EpochContext, TransactionProcessor, TransferProcessor};
pub use kv::{KvStore, MemKvStore};
