//! Store error types.

use strata_primitives::CodecError;

/// Top-level error type for the store crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Malformed bytes during deserialization.
    ///
    /// Recovered locally where a single record is affected (skip and
    /// continue); surfaced only when the whole operation input is bad.
    #[error("codec failure: {0}")]
    Codec(#[from] CodecError),

    /// A trie or disk commit failed. In-memory state is left as-is; the
    /// caller decides retry vs. abort.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// A balance transfer exceeded the sender's funds.
    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds {
        /// Sender balance at the time of the transfer.
        balance: u128,
        /// Amount the transfer required.
        required: u128,
    },

    /// The operation violates the commit/revert state machine — e.g.
    /// reverting without a preceding revertible commit, or committing a
    /// delta that was never serialized.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
}
