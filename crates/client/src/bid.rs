//! Bid creation and commitment.

use rand::{CryptoRng, RngCore};

use auction_crypto::{commit, CryptoError};
use auction_types::{BidValue, Digest, Identity, Salt};

/// A prepared bid ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBid {
    /// Cleartext bid (keep secret until reveal)
    pub value: BidValue,
    /// Commitment the ledger will expose for the stored bid
    pub commitment: Digest,
}

/// Create a salted bid for `bidder`.
///
/// # Arguments
/// * `bidder` - Identity placing the bid; its organization stores the bid
/// * `price` - The bid amount
/// * `rng` - Cryptographically secure random number generator for the salt
///
/// # Returns
/// A prepared bid with its commitment
pub fn create_bid<R: RngCore + CryptoRng>(
    bidder: &Identity,
    price: u64,
    rng: &mut R,
) -> Result<PreparedBid, CryptoError> {
    let mut salt = [0u8; 32];
    rng.fill_bytes(&mut salt);

    let value = BidValue {
        price,
        org: bidder.org.clone(),
        bidder: bidder.id.clone(),
        salt: Salt(salt),
    };
    let commitment = commit(&value)?;

    Ok(PreparedBid { value, commitment })
}

/// Builder for creating bids.
pub struct BidBuilder {
    bidder: Identity,
    price: u64,
}

impl BidBuilder {
    /// Create a new bid builder.
    pub fn new(bidder: Identity) -> Self {
        Self { bidder, price: 0 }
    }

    /// Set the bid price.
    pub fn price(mut self, price: u64) -> Self {
        self.price = price;
        self
    }

    /// Build the prepared bid.
    pub fn build<R: RngCore + CryptoRng>(self, rng: &mut R) -> Result<PreparedBid, CryptoError> {
        create_bid(&self.bidder, self.price, rng)
    }
}
