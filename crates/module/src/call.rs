//! Call message types for the auction module.

use auction_types::{BidKey, BidValue, Digest, RevealedBid};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Call messages for the auction module.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum AuctionCall {
    // === Auction Lifecycle ===
    /// Open a new auction with the caller as seller.
    CreateAuction { auction_id: String, item: String },

    /// Close bidding (seller only).
    CloseAuction { auction_id: String },

    /// Pick the winner once no hidden bid can beat it (seller only).
    EndAuction { auction_id: String },

    // === Bidding ===
    /// Store a bid in the caller's private collection.
    ///
    /// Must be endorsed by the caller's organization alone.
    CreateBid { auction_id: String, value: BidValue },

    /// Anchor a stored bid in the auction.
    SubmitCommitment {
        auction_id: String,
        bid_key: BidKey,
        commitment: Digest,
    },

    /// Open a committed bid.
    RevealBid {
        auction_id: String,
        bid_key: BidKey,
        value: BidValue,
    },
}

impl AuctionCall {
    /// Auction the call operates on.
    pub fn auction_id(&self) -> &str {
        match self {
            AuctionCall::CreateAuction { auction_id, .. }
            | AuctionCall::CloseAuction { auction_id }
            | AuctionCall::EndAuction { auction_id }
            | AuctionCall::CreateBid { auction_id, .. }
            | AuctionCall::SubmitCommitment { auction_id, .. }
            | AuctionCall::RevealBid { auction_id, .. } => auction_id,
        }
    }
}

/// Result of a successfully executed call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutcome {
    AuctionCreated,
    /// Key the bid was stored under
    BidCreated(BidKey),
    CommitmentSubmitted,
    AuctionClosed,
    /// Best revealed price after the reveal
    BidRevealed { best_price: u64 },
    /// The winning bid
    AuctionEnded(RevealedBid),
}
