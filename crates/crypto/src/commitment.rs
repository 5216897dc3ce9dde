//! Hash commitments over bid values.
//!
//! A commitment C = SHA-256(borsh(value)) is:
//! - **Hiding**: the salt inside the value makes C independent of the price
//! - **Binding**: a different (price, org, bidder, salt) gives a different C
//!
//! Used to anchor bids on the public ledger before their prices are revealed.

use auction_types::{BidValue, Digest};

use crate::error::CryptoError;

/// Canonical byte encoding of a bid value.
///
/// These are the bytes a bidder stores in private storage, so the ledger's
/// private data hash of a stored bid equals [`commit`] of the same value.
pub fn encode_bid_value(value: &BidValue) -> Result<Vec<u8>, CryptoError> {
    borsh::to_vec(value).map_err(|e| CryptoError::SerializationError(e.to_string()))
}

/// Decode a bid value from its canonical encoding.
///
/// Trailing bytes are rejected, so every accepted byte string has exactly one
/// decoding.
pub fn decode_bid_value(bytes: &[u8]) -> Result<BidValue, CryptoError> {
    borsh::from_slice(bytes).map_err(|e| CryptoError::InvalidEncoding(e.to_string()))
}

/// Commitment to already encoded bid bytes.
pub fn commit_bytes(encoded: &[u8]) -> Digest {
    Digest::of(encoded)
}

/// Create a commitment to a bid value.
///
/// # Arguments
/// * `value` - The cleartext bid, including its salt
///
/// # Returns
/// The digest to be anchored on the ledger
pub fn commit(value: &BidValue) -> Result<Digest, CryptoError> {
    Ok(commit_bytes(&encode_bid_value(value)?))
}

/// Verify that `value` opens `commitment`.
///
/// Exact comparison only; a value that cannot be encoded never verifies.
pub fn verify(value: &BidValue, commitment: &Digest) -> bool {
    match commit(value) {
        Ok(computed) => &computed == commitment,
        Err(_) => false,
    }
}
