//! Highest-bid audit run before an auction may end.
//!
//! No single peer can see every bid. Each organization's peer inspects the
//! unrevealed bids it holds itself and, for everyone else's, only that the
//! anchored commitment is still intact. Finalization is endorsed by every
//! participating organization, so together the audits cover every bid.

use auction_crypto::{commit_bytes, decode_bid_value};
use auction_ledger::Ledger;
use auction_types::{Auction, BidCommitment, BidKey, OrgId};
use tracing::{debug, warn};

use crate::genesis::AuditConfig;
use crate::handlers::HandlerResult;

/// Why an unrevealed bid blocks finalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockReason {
    /// Our own unrevealed bid beats the best revealed price
    HigherPrice { price: u64 },
    /// Our own bid value cannot be read back
    ValueUnavailable,
    /// The stored value no longer exists
    AnchorMissing,
    /// The stored value differs from what was committed
    AnchorChanged,
    /// The committing organization has revealed nothing, so its bid is unknown
    OrgNotRevealed(OrgId),
}

/// Outcome of the audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuditReport {
    /// No unrevealed bid can exceed the best price
    Clear,
    /// `bid_key` may exceed the current best price
    Blocked { bid_key: BidKey, reason: BlockReason },
}

impl AuditReport {
    pub fn is_clear(&self) -> bool {
        matches!(self, AuditReport::Clear)
    }
}

/// Check every unrevealed commitment of `auction` against `best_price`.
///
/// Runs with the data of the executing peer's organization only.
pub fn audit_unrevealed_bids<L: Ledger>(
    ledger: &mut L,
    auction: &Auction,
    best_price: u64,
    config: &AuditConfig,
) -> HandlerResult<AuditReport> {
    let local_org = ledger.local_org().clone();

    for (bid_key, commitment) in auction.unrevealed() {
        let blocked = if commitment.org == local_org {
            audit_own_bid(ledger, bid_key, commitment, best_price)?
        } else {
            audit_foreign_bid(ledger, auction, bid_key, commitment, config)?
        };

        if let Some(reason) = blocked {
            warn!(
                auction_id = %auction.auction_id,
                bid_key = %bid_key,
                org = %commitment.org,
                peer = %local_org,
                ?reason,
                "unrevealed bid blocks auction end"
            );
            return Ok(AuditReport::Blocked {
                bid_key: bid_key.clone(),
                reason,
            });
        }
        debug!(bid_key = %bid_key, peer = %local_org, "unrevealed bid cleared");
    }

    Ok(AuditReport::Clear)
}

fn audit_own_bid<L: Ledger>(
    ledger: &mut L,
    bid_key: &BidKey,
    commitment: &BidCommitment,
    best_price: u64,
) -> HandlerResult<Option<BlockReason>> {
    let Some(bytes) = ledger.get_private(&commitment.org, bid_key.as_str())? else {
        return Ok(Some(BlockReason::ValueUnavailable));
    };
    if commit_bytes(&bytes) != commitment.anchored {
        return Ok(Some(BlockReason::AnchorChanged));
    }
    let reason = match decode_bid_value(&bytes) {
        Err(_) => Some(BlockReason::ValueUnavailable),
        Ok(value) if value.price > best_price => Some(BlockReason::HigherPrice { price: value.price }),
        Ok(_) => None,
    };
    Ok(reason)
}

fn audit_foreign_bid<L: Ledger>(
    ledger: &mut L,
    auction: &Auction,
    bid_key: &BidKey,
    commitment: &BidCommitment,
    config: &AuditConfig,
) -> HandlerResult<Option<BlockReason>> {
    match ledger.private_commitment_ref(&commitment.org, bid_key.as_str())? {
        None => return Ok(Some(BlockReason::AnchorMissing)),
        Some(current) if current != commitment.anchored => {
            return Ok(Some(BlockReason::AnchorChanged))
        }
        Some(_) => {}
    }
    if config.block_on_silent_orgs && !auction.org_has_revealed(&commitment.org) {
        return Ok(Some(BlockReason::OrgNotRevealed(commitment.org.clone())));
    }
    Ok(None)
}
