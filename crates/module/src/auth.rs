//! Caller entitlement checks.

use auction_ledger::Ledger;
use auction_types::{Auction, BidCommitment, BidValue, Identity, OrgId};

use crate::error::AuctionError;
use crate::handlers::HandlerResult;

/// Authenticated identity of the caller.
pub fn caller<L: Ledger>(ledger: &L) -> HandlerResult<Identity> {
    Ok(ledger.caller_identity()?)
}

/// The caller must belong to the organization of the executing peer.
///
/// Private data only leaves a peer towards clients of the peer's own
/// organization.
pub fn require_org_matches_peer<L: Ledger>(ledger: &L, caller: &Identity) -> HandlerResult<()> {
    if &caller.org != ledger.local_org() {
        return Err(AuctionError::NotAuthorized(format!(
            "client of {} cannot use private data on a {} peer",
            caller.org,
            ledger.local_org()
        )));
    }
    Ok(())
}

/// The caller must be inside `party`'s private storage domain.
pub fn require_private_domain<L: Ledger>(
    ledger: &L,
    caller: &Identity,
    party: &OrgId,
) -> HandlerResult<()> {
    require_org_matches_peer(ledger, caller)?;
    if &caller.org != party {
        return Err(AuctionError::NotAuthorized(format!(
            "client of {} cannot access private data of {party}",
            caller.org
        )));
    }
    Ok(())
}

/// Only the seller may close or end an auction.
///
/// Client ids are only unique within an organization, so both parts of the
/// identity must match.
pub fn require_seller(auction: &Auction, caller: &Identity) -> HandlerResult<()> {
    if &auction.seller != caller {
        return Err(AuctionError::NotSeller);
    }
    Ok(())
}

/// A reveal must come from the identity that committed the bid, and that
/// identity must be the bidder named inside the revealed value.
pub fn require_bid_owner(
    commitment: &BidCommitment,
    caller: &Identity,
    value: &BidValue,
) -> HandlerResult<()> {
    if &commitment.submitter != caller || value.bidder != caller.id {
        return Err(AuctionError::NotBidOwner);
    }
    Ok(())
}
