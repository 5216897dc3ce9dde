//! Query handlers for the auction module.
//!
//! These functions provide read-only access to auction state. They are run
//! with [`MemoryLedger::evaluate`](auction_ledger::MemoryLedger::evaluate) on a
//! single peer and never commit.

use auction_ledger::Ledger;
use auction_types::{parse_bid_key, Auction, AuctionStatus, BidKey, BidValue, ClientId, Identity};
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::error::AuctionError;
use crate::handlers::HandlerResult;
use crate::state;

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    /// Get the public auction record.
    GetAuction { auction_id: String },

    /// Get a summary of the auction.
    GetSummary { auction_id: String },

    /// Read back one of the caller's own private bids.
    GetBid { auction_id: String, bid_key: BidKey },
}

/// Query response types.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    /// Auction record.
    Auction(Auction),

    /// Auction summary.
    Summary(AuctionSummary),

    /// Cleartext bid.
    Bid(BidValue),
}

/// Handle a query.
pub fn handle_query<L: Ledger>(ledger: &mut L, query: &AuctionQuery) -> HandlerResult<AuctionQueryResponse> {
    match query {
        AuctionQuery::GetAuction { auction_id } => {
            query_auction(ledger, auction_id).map(AuctionQueryResponse::Auction)
        }
        AuctionQuery::GetSummary { auction_id } => query_auction(ledger, auction_id)
            .map(|auction| AuctionQueryResponse::Summary(AuctionSummary::from_auction(&auction))),
        AuctionQuery::GetBid {
            auction_id,
            bid_key,
        } => query_bid(ledger, auction_id, bid_key).map(AuctionQueryResponse::Bid),
    }
}

/// Public auction record, in any status.
pub fn query_auction<L: Ledger>(ledger: &mut L, auction_id: &str) -> HandlerResult<Auction> {
    state::load_auction(ledger, auction_id)
}

/// The caller's own bid, read from its organization's private collection.
pub fn query_bid<L: Ledger>(
    ledger: &mut L,
    auction_id: &str,
    bid_key: &BidKey,
) -> HandlerResult<BidValue> {
    let caller = auth::caller(&*ledger)?;
    auth::require_org_matches_peer(&*ledger, &caller)?;

    if !matches!(parse_bid_key(bid_key), Some((key_auction, _)) if key_auction == auction_id) {
        return Err(AuctionError::InvalidInput(format!(
            "bid key {bid_key} does not belong to auction {auction_id}"
        )));
    }

    let value = state::get_committed_value(ledger, &caller.org, bid_key)?;
    if value.bidder != caller.id {
        return Err(AuctionError::NotBidOwner);
    }
    Ok(value)
}

/// Summary of an auction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub auction_id: String,
    pub item: String,
    pub seller: Identity,
    pub status: AuctionStatus,
    pub num_parties: usize,
    pub num_commitments: usize,
    pub num_revealed: usize,
    pub best_price: u64,
    pub winner: Option<ClientId>,
}

impl AuctionSummary {
    pub fn from_auction(auction: &Auction) -> Self {
        Self {
            auction_id: auction.auction_id.clone(),
            item: auction.item.clone(),
            seller: auction.seller.clone(),
            status: auction.status,
            num_parties: auction.parties.len(),
            num_commitments: auction.commitments.len(),
            num_revealed: auction.revealed.len(),
            best_price: auction.best_price,
            winner: auction.winner.clone(),
        }
    }
}
