//! Client SDK for sealed-bid ledger auctions.
//!
//! This crate provides a high-level API for:
//! - Preparing salted bids and their commitments
//! - Storing bids privately and anchoring them in an auction
//! - Revealing bids and finalizing auctions with the right endorsers
//! - Querying auction state

pub mod bid;
pub mod client;

pub use bid::{create_bid, BidBuilder, PreparedBid};
pub use client::{AuctionClient, ClientError, ClientResult};
