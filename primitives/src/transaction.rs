//! Transaction and receipt boundary types.
//!
//! Transactions arrive from the submission layer as typed values; the wire
//! format below is used for signing and for transport.
//!
//! ## Wire Format (little-endian)
//!
//! ```text
//! [nonce: 8 bytes LE]
//! [payload_type: 1 byte]
//!   0x01 = Transfer { to: 20 bytes, amount: 16 bytes LE }
//!   0x02 = Deploy { code: var_bytes }
//! [public_key: 32 bytes]
//! [signature: 64 bytes]
//! ```
//!
//! The signature covers everything before the public_key field:
//! `nonce || payload_type || payload_data`. The sender address is derived
//! from the public key, not carried on the wire.

use crate::codec::{write_address, write_u128, write_u64, write_var_bytes, Reader};
use crate::crypto::address_from_public_key;
use crate::error::CodecError;
use crate::types::Address;

/// Payload type tag for transfers.
const PAYLOAD_TRANSFER: u8 = 0x01;
/// Payload type tag for contract deployment.
const PAYLOAD_DEPLOY: u8 = 0x02;

/// Transaction payload variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxPayload {
    /// Transfer tokens from sender to recipient.
    Transfer {
        /// Recipient address.
        to: Address,
        /// Amount to transfer.
        amount: u128,
    },
    /// Deploy a contract with the given bytecode.
    Deploy {
        /// Contract bytecode.
        code: Vec<u8>,
    },
}

/// A transaction ready for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Sequence number for replay protection.
    pub nonce: u64,
    /// Transaction payload.
    pub payload: TxPayload,
    /// Ed25519 public key of the sender.
    pub public_key: [u8; 32],
    /// Ed25519 signature over the signed portion.
    pub signature: [u8; 64],
}

impl Transaction {
    /// Derive the sender address from the public key.
    pub fn sender(&self) -> Address {
        address_from_public_key(&self.public_key)
    }

    /// The bytes covered by the signature.
    pub fn signed_data(&self) -> Vec<u8> {
        encode_signed_portion(self.nonce, &self.payload)
    }
}

fn encode_signed_portion(nonce: u64, payload: &TxPayload) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    write_u64(&mut buf, nonce);
    match payload {
        TxPayload::Transfer { to, amount } => {
            buf.push(PAYLOAD_TRANSFER);
            write_address(&mut buf, to);
            write_u128(&mut buf, *amount);
        }
        TxPayload::Deploy { code } => {
            buf.push(PAYLOAD_DEPLOY);
            write_var_bytes(&mut buf, code);
        }
    }
    buf
}

/// Encode a transaction to wire bytes.
pub fn encode_transaction(tx: &Transaction) -> Vec<u8> {
    let mut raw = encode_signed_portion(tx.nonce, &tx.payload);
    raw.extend_from_slice(&tx.public_key);
    raw.extend_from_slice(&tx.signature);
    raw
}

/// Decode a transaction from wire bytes.
pub fn decode_transaction(raw: &[u8]) -> Result<Transaction, CodecError> {
    let mut r = Reader::new(raw);

    let nonce = r.read_u64()?;
    let payload_type = r.read_bytes(1)?[0];
    let payload = match payload_type {
        PAYLOAD_TRANSFER => TxPayload::Transfer {
            to: r.read_address()?,
            amount: r.read_u128()?,
        },
        PAYLOAD_DEPLOY => TxPayload::Deploy {
            code: r.read_var_bytes()?,
        },
        _ => {
            return Err(CodecError::InvalidValue(format!(
                "unknown payload type: 0x{:02x}",
                payload_type
            )));
        }
    };

    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(r.read_bytes(32)?);
    let mut signature = [0u8; 64];
    signature.copy_from_slice(r.read_bytes(64)?);
    if r.remaining() != 0 {
        return Err(CodecError::InvalidValue("trailing transaction bytes".into()));
    }

    Ok(Transaction {
        nonce,
        payload,
        public_key,
        signature,
    })
}

/// Build and sign a transaction with the given key.
pub fn sign_transaction(
    nonce: u64,
    payload: TxPayload,
    signing_key: &ed25519_dalek::SigningKey,
) -> Transaction {
    let signed_data = encode_signed_portion(nonce, &payload);
    let signature = crate::crypto::sign_ed25519(&signed_data, signing_key);
    Transaction {
        nonce,
        payload,
        public_key: *signing_key.verifying_key().as_bytes(),
        signature,
    }
}

/// Per-transaction execution receipt.
///
/// A rejected transaction leaves the receipt in its cleared (default) state;
/// only accepted transactions populate it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Receipt {
    /// Whether the transaction was accepted and applied.
    pub success: bool,
    /// Epoch in which the transaction was applied.
    pub epoch: u64,
    /// Gas charged for the transaction.
    pub gas_used: u64,
}

impl Receipt {
    /// Reset the receipt to its cleared state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
