//! Call handlers for the auction module.
//!
//! These functions implement the business logic for each call type. Every
//! handler runs inside one ledger transaction; returning an error aborts the
//! transaction and nothing it wrote is committed.

use auction_crypto::verify;
use auction_ledger::Ledger;
use auction_types::{
    compute_bid_key, key_digest, parse_bid_key, Auction, AuctionStatus, BidCommitment, BidKey,
    BidValue, Digest, RevealedBid,
};
use tracing::{debug, info, warn};

use crate::auditor::{audit_unrevealed_bids, AuditReport};
use crate::auth;
use crate::call::{AuctionCall, CallOutcome};
use crate::error::AuctionError;
use crate::genesis::{AuctionGenesisConfig, AuctionLimits};
use crate::state;

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

/// Execute a call against the ledger with the executing peer's configuration.
pub fn dispatch<L: Ledger>(ledger: &mut L, call: &AuctionCall) -> HandlerResult<CallOutcome> {
    let config = AuctionGenesisConfig::for_peer(&*ledger)?;
    match call {
        AuctionCall::CreateAuction { auction_id, item } => {
            handle_create_auction(ledger, &config, auction_id, item)?;
            Ok(CallOutcome::AuctionCreated)
        }
        AuctionCall::CreateBid { auction_id, value } => {
            handle_create_bid(ledger, auction_id, value).map(CallOutcome::BidCreated)
        }
        AuctionCall::SubmitCommitment {
            auction_id,
            bid_key,
            commitment,
        } => {
            handle_submit_commitment(ledger, auction_id, bid_key, commitment)?;
            Ok(CallOutcome::CommitmentSubmitted)
        }
        AuctionCall::CloseAuction { auction_id } => {
            handle_close_auction(ledger, auction_id)?;
            Ok(CallOutcome::AuctionClosed)
        }
        AuctionCall::RevealBid {
            auction_id,
            bid_key,
            value,
        } => handle_reveal_bid(ledger, auction_id, bid_key, value)
            .map(|best_price| CallOutcome::BidRevealed { best_price }),
        AuctionCall::EndAuction { auction_id } => {
            handle_end_auction(ledger, &config, auction_id).map(CallOutcome::AuctionEnded)
        }
    }
}

fn validate_field(field: &str, value: &str, max_len: usize) -> HandlerResult<()> {
    if value.is_empty() {
        return Err(AuctionError::InvalidInput(format!("{field} is empty")));
    }
    if value.len() > max_len {
        return Err(AuctionError::InvalidInput(format!(
            "{field} exceeds {max_len} bytes"
        )));
    }
    if value.contains('\u{0}') {
        return Err(AuctionError::InvalidInput(format!(
            "{field} contains a NUL character"
        )));
    }
    Ok(())
}

fn validate_auction_id(auction_id: &str, limits: &AuctionLimits) -> HandlerResult<()> {
    validate_field("auction id", auction_id, limits.max_auction_id_len)
}

/// Handle CreateAuction call.
///
/// The caller becomes the seller and the seller's organization the first
/// party and sole approver of the auction record.
pub fn handle_create_auction<L: Ledger>(
    ledger: &mut L,
    config: &AuctionGenesisConfig,
    auction_id: &str,
    item: &str,
) -> HandlerResult<()> {
    validate_auction_id(auction_id, &config.limits)?;
    validate_field("item", item, config.limits.max_item_len)?;

    let seller = auth::caller(&*ledger)?;
    if state::auction_exists(ledger, auction_id)? {
        return Err(AuctionError::AlreadyExists(auction_id.to_string()));
    }

    let auction = Auction::new(auction_id, item, &seller);
    state::store_auction(ledger, &auction)?;
    ledger.set_approvers(auction_id, [seller.org.clone()].into_iter().collect())?;

    info!(auction_id = %auction_id, seller = %seller, "auction created");
    Ok(())
}

/// Handle CreateBid call.
///
/// Stores the cleartext bid in the caller's private collection and returns the
/// key it is stored under. Nothing public is written.
pub fn handle_create_bid<L: Ledger>(
    ledger: &mut L,
    auction_id: &str,
    value: &BidValue,
) -> HandlerResult<BidKey> {
    let caller = auth::caller(&*ledger)?;
    auth::require_org_matches_peer(&*ledger, &caller)?;
    if value.bidder != caller.id || value.org != caller.org {
        return Err(AuctionError::NotBidOwner);
    }

    let auction = state::load_auction(ledger, auction_id)?;
    if auction.status != AuctionStatus::Open {
        return Err(AuctionError::AuctionNotOpen { got: auction.status });
    }

    let bid_key = compute_bid_key(auction_id, ledger.tx_id()).ok_or_else(|| {
        AuctionError::InvalidInput(format!("cannot build a bid key for auction {auction_id}"))
    })?;
    state::put_commitment(ledger, &caller.org, &bid_key, value)?;

    debug!(auction_id = %auction_id, bid_key = %bid_key, org = %caller.org, "bid created");
    Ok(bid_key)
}

/// Handle SubmitCommitment call.
///
/// Anchors a stored bid in the auction. The committing organization is always
/// the caller's own; the claimed commitment must match what the ledger holds.
pub fn handle_submit_commitment<L: Ledger>(
    ledger: &mut L,
    auction_id: &str,
    bid_key: &BidKey,
    claimed: &Digest,
) -> HandlerResult<()> {
    let caller = auth::caller(&*ledger)?;

    match parse_bid_key(bid_key) {
        Some((key_auction, _)) if key_auction == auction_id => {}
        _ => {
            return Err(AuctionError::InvalidInput(format!(
                "bid key {bid_key} does not belong to auction {auction_id}"
            )))
        }
    }

    let mut auction = state::load_auction(ledger, auction_id)?;
    if auction.status != AuctionStatus::Open {
        return Err(AuctionError::AuctionNotOpen { got: auction.status });
    }
    if auction.commitments.contains_key(bid_key) {
        return Err(AuctionError::BidAlreadyExists(bid_key.clone()));
    }

    let anchored = match state::get_commitment_reference(ledger, &caller.org, bid_key) {
        Ok(reference) => reference,
        Err(AuctionError::BidNotFound(key)) => return Err(AuctionError::CommitmentMissing(key)),
        Err(e) => return Err(e),
    };
    if &anchored != claimed {
        warn!(auction_id = %auction_id, bid_key = %bid_key, org = %caller.org, "claimed commitment does not match stored bid");
        return Err(AuctionError::CommitmentMismatch(bid_key.clone()));
    }

    let commitment = BidCommitment {
        org: caller.org.clone(),
        submitter: caller.clone(),
        commitment_ref: key_digest(bid_key),
        anchored,
        sequence: auction.next_sequence(),
    };
    auction.commitments.insert(bid_key.clone(), commitment);

    if auction.add_party(&caller.org) {
        ledger.add_approver(auction_id, &caller.org)?;
        debug!(auction_id = %auction_id, org = %caller.org, "organization joined auction");
    }
    state::store_auction(ledger, &auction)?;

    info!(auction_id = %auction_id, bid_key = %bid_key, org = %caller.org, "bid committed");
    Ok(())
}

/// Handle CloseAuction call.
pub fn handle_close_auction<L: Ledger>(ledger: &mut L, auction_id: &str) -> HandlerResult<()> {
    let caller = auth::caller(&*ledger)?;
    let mut auction = state::load_auction(ledger, auction_id)?;
    auth::require_seller(&auction, &caller)?;

    if auction.status != AuctionStatus::Open {
        return Err(AuctionError::AuctionNotOpen { got: auction.status });
    }
    auction.status = AuctionStatus::Closed;
    state::store_auction(ledger, &auction)?;

    info!(auction_id = %auction_id, commitments = auction.commitments.len(), "auction closed");
    Ok(())
}

/// Handle RevealBid call.
///
/// Returns the best revealed price after the reveal.
pub fn handle_reveal_bid<L: Ledger>(
    ledger: &mut L,
    auction_id: &str,
    bid_key: &BidKey,
    value: &BidValue,
) -> HandlerResult<u64> {
    let caller = auth::caller(&*ledger)?;
    let mut auction = state::load_auction(ledger, auction_id)?;

    if auction.status != AuctionStatus::Closed {
        return Err(AuctionError::AuctionNotClosed { got: auction.status });
    }
    let commitment = auction
        .commitments
        .get(bid_key)
        .ok_or_else(|| AuctionError::BidNotFound(bid_key.clone()))?;
    if auction.revealed.contains_key(bid_key) {
        return Err(AuctionError::BidAlreadyRevealed(bid_key.clone()));
    }
    auth::require_bid_owner(commitment, &caller, value)?;

    if value.org != commitment.org || !verify(value, &commitment.anchored) {
        warn!(auction_id = %auction_id, bid_key = %bid_key, "revealed bid does not match commitment");
        return Err(AuctionError::CommitmentMismatch(bid_key.clone()));
    }
    let current = state::get_commitment_reference(ledger, &commitment.org, bid_key)
        .map_err(|_| AuctionError::CommitmentMismatch(bid_key.clone()))?;
    if current != commitment.anchored {
        warn!(auction_id = %auction_id, bid_key = %bid_key, "stored bid changed since commitment");
        return Err(AuctionError::CommitmentMismatch(bid_key.clone()));
    }

    auction.revealed.insert(
        bid_key.clone(),
        RevealedBid {
            price: value.price,
            org: commitment.org.clone(),
            bidder: commitment.submitter.id.clone(),
        },
    );
    auction.best_price = auction
        .highest_revealed()
        .map(|(_, bid)| bid.price)
        .unwrap_or_default();
    state::store_auction(ledger, &auction)?;

    info!(auction_id = %auction_id, bid_key = %bid_key, best_price = auction.best_price, "bid revealed");
    Ok(auction.best_price)
}

/// Handle EndAuction call.
///
/// Picks the best revealed bid and refuses to finalize while any unrevealed
/// bid visible to this peer could beat it.
pub fn handle_end_auction<L: Ledger>(
    ledger: &mut L,
    config: &AuctionGenesisConfig,
    auction_id: &str,
) -> HandlerResult<RevealedBid> {
    let caller = auth::caller(&*ledger)?;
    let mut auction = state::load_auction(ledger, auction_id)?;
    auth::require_seller(&auction, &caller)?;

    if auction.status != AuctionStatus::Closed {
        return Err(AuctionError::AuctionNotClosed { got: auction.status });
    }
    let winning = auction
        .highest_revealed()
        .map(|(_, bid)| bid.clone())
        .ok_or(AuctionError::NoRevealedBids)?;

    match audit_unrevealed_bids(ledger, &auction, winning.price, &config.audit)? {
        AuditReport::Clear => {}
        AuditReport::Blocked { bid_key, .. } => {
            return Err(AuctionError::UnrevealedHigherBidExists(bid_key));
        }
    }

    auction.status = AuctionStatus::Ended;
    auction.best_price = winning.price;
    auction.winner = Some(winning.bidder.clone());
    state::store_auction(ledger, &auction)?;

    info!(
        auction_id = %auction_id,
        winner = %winning.bidder,
        price = winning.price,
        peer = %ledger.local_org(),
        "auction ended"
    );
    Ok(winning)
}
