//! Ledger storage for auctions and bids.
//!
//! Auctions are public JSON records keyed by their id. Bid values live in the
//! private collection of the bidder's organization, keyed by the bid key; only
//! their hash is visible to other organizations.

use auction_crypto::{decode_bid_value, encode_bid_value};
use auction_ledger::Ledger;
use auction_types::{Auction, BidKey, BidValue, Digest, OrgId};
use tracing::debug;

use crate::auth;
use crate::error::AuctionError;
use crate::handlers::HandlerResult;

/// Whether an auction record exists.
pub fn auction_exists<L: Ledger>(ledger: &mut L, auction_id: &str) -> HandlerResult<bool> {
    Ok(ledger.get_state(auction_id)?.is_some())
}

/// Load an auction record.
pub fn load_auction<L: Ledger>(ledger: &mut L, auction_id: &str) -> HandlerResult<Auction> {
    let bytes = ledger
        .get_state(auction_id)?
        .ok_or_else(|| AuctionError::AuctionNotFound(auction_id.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| AuctionError::CorruptRecord(e.to_string()))
}

/// Store an auction record.
pub fn store_auction<L: Ledger>(ledger: &mut L, auction: &Auction) -> HandlerResult<()> {
    let bytes =
        serde_json::to_vec(auction).map_err(|e| AuctionError::CorruptRecord(e.to_string()))?;
    ledger.put_state(&auction.auction_id, bytes)?;
    Ok(())
}

/// Store a bid value in `party`'s private collection.
///
/// Returns the commitment the ledger will expose for the stored bytes.
pub fn put_commitment<L: Ledger>(
    ledger: &mut L,
    party: &OrgId,
    bid_key: &BidKey,
    value: &BidValue,
) -> HandlerResult<Digest> {
    let caller = auth::caller(&*ledger)?;
    auth::require_private_domain(&*ledger, &caller, party)?;

    let encoded = encode_bid_value(value)?;
    let commitment = auction_crypto::commit_bytes(&encoded);
    ledger.put_private(party, bid_key.as_str(), encoded)?;

    debug!(org = %party, bid_key = %bid_key, "bid stored in private collection");
    Ok(commitment)
}

/// Ledger proof that a value is stored under `bid_key` in `party`'s collection.
pub fn get_commitment_reference<L: Ledger>(
    ledger: &mut L,
    party: &OrgId,
    bid_key: &BidKey,
) -> HandlerResult<Digest> {
    ledger
        .private_commitment_ref(party, bid_key.as_str())?
        .ok_or_else(|| AuctionError::BidNotFound(bid_key.clone()))
}

/// Read a bid value back from `party`'s private collection.
pub fn get_committed_value<L: Ledger>(
    ledger: &mut L,
    party: &OrgId,
    bid_key: &BidKey,
) -> HandlerResult<BidValue> {
    let caller = auth::caller(&*ledger)?;
    auth::require_private_domain(&*ledger, &caller, party)?;

    let bytes = ledger
        .get_private(party, bid_key.as_str())?
        .ok_or_else(|| AuctionError::BidNotFound(bid_key.clone()))?;
    Ok(decode_bid_value(&bytes)?)
}
