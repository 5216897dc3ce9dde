//! Auction module error types.

use thiserror::Error;

use auction_crypto::CryptoError;
use auction_ledger::LedgerError;
use auction_types::{AuctionStatus, BidKey};

use crate::genesis::GenesisValidationError;

/// Errors that can occur in the auction module.
///
/// Every error rejects the whole transaction; no state changes are committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Auction not found: {0}")]
    AuctionNotFound(String),

    #[error("Bid not found: {0}")]
    BidNotFound(BidKey),

    #[error("Auction already exists: {0}")]
    AlreadyExists(String),

    #[error("Bid already committed: {0}")]
    BidAlreadyExists(BidKey),

    #[error("Bid already revealed: {0}")]
    BidAlreadyRevealed(BidKey),

    #[error("Auction is not open (status: {got})")]
    AuctionNotOpen { got: AuctionStatus },

    #[error("Auction is not closed (status: {got})")]
    AuctionNotClosed { got: AuctionStatus },

    #[error("Only the seller can perform this action")]
    NotSeller,

    #[error("Caller is not the owner of the bid")]
    NotBidOwner,

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Bid {0} does not match its commitment")]
    CommitmentMismatch(BidKey),

    #[error("No stored bid found for {0}")]
    CommitmentMissing(BidKey),

    #[error("Bid {0} may exceed the current best price")]
    UnrevealedHigherBidExists(BidKey),

    #[error("No bids have been revealed")]
    NoRevealedBids,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corrupt auction record: {0}")]
    CorruptRecord(String),

    #[error("Peer configuration error: {0}")]
    Config(#[from] GenesisValidationError),

    #[error("Codec error: {0}")]
    Codec(#[from] CryptoError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
