//! Sealed-bid auction module running on a shared ledger.
//!
//! This module implements the ledger-side logic of a commit-reveal auction:
//!
//! - Auction creation, closing and finalization by the seller
//! - Bids stored in the bidder organization's private collection and anchored
//!   in the public auction record by their ledger hash
//! - Reveal verification against the anchored hash
//! - A per-organization audit that refuses to finalize while an unrevealed
//!   bid could beat the best revealed one
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `queries`: Read-only state access
//! - `state`: Ledger storage of auctions and bids
//! - `auditor`: Highest-bid audit before finalization
//! - `auth`: Caller entitlement checks
//! - `genesis`: Deployment configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use auction_ledger::MemoryLedger;
//! use auction_module::{dispatch, AuctionCall};
//!
//! let ledger = MemoryLedger::new();
//! ledger.configure_peer(&seller.org, r#"{ "audit": { "block_on_silent_orgs": true } }"#);
//! let call = AuctionCall::CreateAuction { auction_id: "A1".into(), item: "vase".into() };
//!
//! ledger.submit(&seller, &[seller.org.clone()], |stub| dispatch(stub, &call))?;
//! ```

pub mod auditor;
pub mod auth;
pub mod call;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod queries;
pub mod state;

pub use auditor::{AuditReport, BlockReason};
pub use call::{AuctionCall, CallOutcome};
pub use error::AuctionError;
pub use genesis::{AuctionGenesisConfig, AuctionLimits, AuditConfig, GenesisValidationError};
pub use handlers::{dispatch, HandlerResult};
pub use queries::{handle_query, AuctionQuery, AuctionQueryResponse, AuctionSummary};
