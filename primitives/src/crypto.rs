//! Cryptographic operations for the Strata account-state store.
//!
//! - BLAKE3 for trie node hashing
//! - SHA-256 for state-delta digests and address derivation
//! - Ed25519 for transaction signatures
//!
//! All operations are deterministic; keypair generation is the only function
//! that draws randomness and is never called on a consensus path.

use crate::types::{Address, Hash};

/// Compute BLAKE3 hash of the input data.
///
/// Used for trie leaf and internal node hashing.
pub fn hash_blake3(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Compute SHA-256 hash of the input data.
///
/// Used for the state-delta digest and for address derivation.
pub fn hash_sha256(data: &[u8]) -> Hash {
    use sha2::Digest;
    let result = sha2::Sha256::digest(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Derive an account address from an Ed25519 public key.
///
/// The address is the last 20 bytes of SHA-256 over the raw public key.
pub fn address_from_public_key(public_key: &[u8; 32]) -> Address {
    let digest = hash_sha256(public_key);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest[12..]);
    addr
}

/// Verify an Ed25519 signature.
///
/// Returns `true` if the signature is valid for the given message and
/// public key, `false` otherwise.
pub fn verify_ed25519(message: &[u8], signature: &[u8; 64], public_key: &[u8; 32]) -> bool {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let sig = Signature::from_bytes(signature);
    verifying_key.verify(message, &sig).is_ok()
}

/// Sign a message with an Ed25519 private key.
///
/// Used in tests and by the submission layer; never inside the store engine.
pub fn sign_ed25519(message: &[u8], secret_key: &ed25519_dalek::SigningKey) -> [u8; 64] {
    use ed25519_dalek::Signer;
    let sig = secret_key.sign(message);
    sig.to_bytes()
}

/// Generate an Ed25519 keypair for testing.
///
/// Uses OS randomness — never used on a consensus path.
pub fn generate_keypair() -> (ed25519_dalek::VerifyingKey, ed25519_dalek::SigningKey) {
    use ed25519_dalek::SigningKey;
    let mut rng = rand::rngs::OsRng;
    let signing_key = SigningKey::generate(&mut rng);
    let verifying_key = signing_key.verifying_key();
    (verifying_key, signing_key)
}
