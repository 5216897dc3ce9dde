//! Commitment primitives for sealed-bid auctions.
//!
//! A bid is committed by hashing its canonical encoding:
//!
//! 1. **Encoding**: the cleartext [`BidValue`](auction_types::BidValue) (price,
//!    org, bidder and a random salt) is serialized with Borsh, which gives one
//!    byte string per value.
//!
//! 2. **Commitment**: `C = SHA-256(encoding)`. The salt keeps `C` hiding even
//!    though prices come from a small range; SHA-256 collision resistance makes
//!    it binding.
//!
//! 3. **Anchoring**: the bidder stores exactly the encoded bytes in private
//!    storage, so the ledger's own hash of that private data equals `C` and can
//!    be checked by anyone without seeing the value.
//!
//! 4. **Verification**: at reveal time the cleartext is re-encoded and compared
//!    with the anchored commitment byte for byte.

pub mod commitment;
pub mod error;

pub use commitment::{commit, commit_bytes, decode_bid_value, encode_bid_value, verify};
pub use error::CryptoError;
