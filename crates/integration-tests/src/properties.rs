//! Cross-cutting behaviour of the auction on a shared ledger: ordering,
//! fencing, endorsement and tamper evidence.

use auction_ledger::{LedgerError, MemoryLedger};
use auction_module::{state, AuctionCall, AuctionError};
use auction_types::{AuctionStatus, ClientId, Identity, OrgId};
use rand::rngs::OsRng;

use crate::support::*;

#[test]
fn test_status_only_moves_forward() -> anyhow::Result<()> {
    init_tracing();
    let ledger = MemoryLedger::new();
    let seller = seller(&ledger);
    let x = bidder(&ledger, "X", "OrgX");

    let mut seen = Vec::new();
    seller.create_auction(AUCTION, "vase")?;
    seen.push(seller.auction(AUCTION)?.status);
    let k1 = x.bid(AUCTION, 10)?;
    seen.push(seller.auction(AUCTION)?.status);
    seller.close_auction(AUCTION)?;
    seen.push(seller.auction(AUCTION)?.status);
    x.reveal_bid(AUCTION, &k1)?;
    seen.push(seller.auction(AUCTION)?.status);
    seller.end_auction(AUCTION)?;
    seen.push(seller.auction(AUCTION)?.status);

    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last(), Some(&AuctionStatus::Ended));

    // everything is frozen once ended
    let ended = seller.auction(AUCTION)?;
    assert!(matches!(
        auction_err(seller.close_auction(AUCTION)),
        AuctionError::AuctionNotOpen { got: AuctionStatus::Ended }
    ));
    assert!(matches!(
        auction_err(seller.end_auction(AUCTION)),
        AuctionError::AuctionNotClosed { got: AuctionStatus::Ended }
    ));
    assert!(matches!(
        auction_err(x.bid(AUCTION, 500)),
        AuctionError::AuctionNotOpen { got: AuctionStatus::Ended }
    ));
    assert!(matches!(
        auction_err(x.reveal_bid(AUCTION, &k1)),
        AuctionError::AuctionNotClosed { got: AuctionStatus::Ended }
    ));
    assert_eq!(seller.auction(AUCTION)?, ended);
    Ok(())
}

#[test]
fn test_single_bit_change_is_rejected() -> anyhow::Result<()> {
    init_tracing();
    let ledger = MemoryLedger::new();
    let seller = seller(&ledger);
    let x = bidder(&ledger, "X", "OrgX");

    seller.create_auction(AUCTION, "vase")?;
    let k1 = x.bid(AUCTION, 0xA5A5)?;
    seller.close_auction(AUCTION)?;
    let value = x.own_bid(AUCTION, &k1)?;

    for bit in 0..64 {
        let mut forged = value.clone();
        forged.price ^= 1 << bit;
        assert_eq!(
            auction_err(x.reveal_value(AUCTION, &k1, &forged)),
            AuctionError::CommitmentMismatch(k1.clone()),
            "price bit {bit}"
        );
    }
    for byte in [0usize, 31] {
        let mut forged = value.clone();
        forged.salt.0[byte] ^= 0x01;
        assert_eq!(
            auction_err(x.reveal_value(AUCTION, &k1, &forged)),
            AuctionError::CommitmentMismatch(k1.clone())
        );
    }

    assert_eq!(x.reveal_bid(AUCTION, &k1)?, 0xA5A5);
    Ok(())
}

#[test]
fn test_duplicate_submission() -> anyhow::Result<()> {
    init_tracing();
    let ledger = MemoryLedger::new();
    let seller = seller(&ledger);
    let x = bidder(&ledger, "X", "OrgX");

    seller.create_auction(AUCTION, "vase")?;
    let k1 = x.bid(AUCTION, 10)?;
    let value = x.own_bid(AUCTION, &k1)?;
    let commitment = auction_crypto::commit(&value)?;

    assert_eq!(
        auction_err(x.submit_commitment(AUCTION, &k1, &commitment)),
        AuctionError::BidAlreadyExists(k1)
    );
    assert_eq!(seller.auction(AUCTION)?.commitments.len(), 1);
    Ok(())
}

#[test]
fn test_queries_do_not_change_state() -> anyhow::Result<()> {
    init_tracing();
    let ledger = MemoryLedger::new();
    let seller = seller(&ledger);
    let x = bidder(&ledger, "X", "OrgX");

    seller.create_auction(AUCTION, "vase")?;
    let k1 = x.bid(AUCTION, 10)?;
    let height = ledger.height();

    let first = x.auction(AUCTION)?;
    let second = x.auction(AUCTION)?;
    assert_eq!(first, second);
    assert_eq!(first, seller.auction(AUCTION)?);
    assert_eq!(x.own_bid(AUCTION, &k1)?, x.own_bid(AUCTION, &k1)?);
    assert_eq!(ledger.height(), height);
    Ok(())
}

/// Two bidders endorse against the same snapshot; only the first commit wins.
#[test]
fn test_concurrent_submissions_first_committer_wins() -> anyhow::Result<()> {
    init_tracing();
    let ledger = MemoryLedger::new();
    let seller = seller(&ledger);
    let x = bidder(&ledger, "X", "OrgX");
    let y = bidder(&ledger, "Y", "OrgY");
    seller.create_auction(AUCTION, "vase")?;

    let px = auction_client::create_bid(x.identity(), 10, &mut OsRng)?;
    let py = auction_client::create_bid(y.identity(), 20, &mut OsRng)?;
    let kx = x.store_bid(AUCTION, &px)?;
    let ky = y.store_bid(AUCTION, &py)?;

    let submit = |bid_key: &auction_types::BidKey, commitment| AuctionCall::SubmitCommitment {
        auction_id: AUCTION.to_string(),
        bid_key: bid_key.clone(),
        commitment,
    };
    let (_, tx_x) = x.endorse(&submit(&kx, px.commitment), &x.endorsers_for(AUCTION)?)?;
    let (_, tx_y) = y.endorse(&submit(&ky, py.commitment), &y.endorsers_for(AUCTION)?)?;

    ledger.commit(tx_x)?;
    assert!(matches!(ledger.commit(tx_y), Err(LedgerError::MvccConflict(_))));

    let auction = seller.auction(AUCTION)?;
    assert!(auction.commitments.contains_key(&kx));
    assert!(!auction.commitments.contains_key(&ky));

    // a retry on the new state goes through and nothing is lost
    y.submit_commitment(AUCTION, &ky, &py.commitment)?;
    let auction = seller.auction(AUCTION)?;
    assert_eq!(auction.commitments.len(), 2);
    assert_eq!(auction.commitments[&kx].sequence, 0);
    assert_eq!(auction.commitments[&ky].sequence, 1);
    assert_eq!(
        auction.parties,
        vec![OrgId::new("SellerOrg"), OrgId::new("OrgX"), OrgId::new("OrgY")]
    );
    Ok(())
}

/// A close that commits first fences a submission endorsed before it.
#[test]
fn test_close_fences_in_flight_submission() -> anyhow::Result<()> {
    init_tracing();
    let ledger = MemoryLedger::new();
    let seller = seller(&ledger);
    let x = bidder(&ledger, "X", "OrgX");
    seller.create_auction(AUCTION, "vase")?;

    let prepared = auction_client::create_bid(x.identity(), 10, &mut OsRng)?;
    let bid_key = x.store_bid(AUCTION, &prepared)?;
    let call = AuctionCall::SubmitCommitment {
        auction_id: AUCTION.to_string(),
        bid_key: bid_key.clone(),
        commitment: prepared.commitment,
    };
    let (_, in_flight) = x.endorse(&call, &x.endorsers_for(AUCTION)?)?;

    seller.close_auction(AUCTION)?;
    assert!(matches!(ledger.commit(in_flight), Err(LedgerError::MvccConflict(_))));

    let auction = seller.auction(AUCTION)?;
    assert_eq!(auction.status, AuctionStatus::Closed);
    assert!(auction.commitments.is_empty());
    assert!(matches!(
        auction_err(x.submit_commitment(AUCTION, &bid_key, &prepared.commitment)),
        AuctionError::AuctionNotOpen { got: AuctionStatus::Closed }
    ));
    Ok(())
}

/// Finalization needs the endorsement of every party.
#[test]
fn test_end_requires_every_party() -> anyhow::Result<()> {
    init_tracing();
    let ledger = MemoryLedger::new();
    let seller = seller(&ledger);
    let x = bidder(&ledger, "X", "OrgX");
    let y = bidder(&ledger, "Y", "OrgY");

    seller.create_auction(AUCTION, "vase")?;
    let kx = x.bid(AUCTION, 100)?;
    y.bid(AUCTION, 500)?;
    seller.close_auction(AUCTION)?;
    x.reveal_bid(AUCTION, &kx)?;

    // skip OrgY, whose peer would report its hidden bid
    let call = AuctionCall::EndAuction {
        auction_id: AUCTION.to_string(),
    };
    configure_peers(&ledger, &["SellerOrg", "OrgX"], LENIENT_AUDIT);
    let result = seller.submit(&call, &[OrgId::new("SellerOrg"), OrgId::new("OrgX")]);
    assert!(matches!(
        auction_err(result),
        AuctionError::Ledger(LedgerError::EndorsementPolicyFailure { missing, .. })
            if missing == vec![OrgId::new("OrgY")]
    ));

    let auction = seller.auction(AUCTION)?;
    assert_eq!(auction.status, AuctionStatus::Closed);
    assert!(auction.winner.is_none());
    Ok(())
}

/// With silent organizations trusted to audit themselves, each peer only
/// blocks on what it can see.
#[test]
fn test_lenient_audit_relies_on_owning_org() -> anyhow::Result<()> {
    init_tracing();
    let ledger = MemoryLedger::new();
    configure_peers(&ledger, &["SellerOrg", "OrgX", "OrgY"], LENIENT_AUDIT);
    let seller = seller(&ledger);
    let x = bidder(&ledger, "X", "OrgX");
    let y = bidder(&ledger, "Y", "OrgY");

    seller.create_auction(AUCTION, "vase")?;
    let kx = x.bid(AUCTION, 100)?;
    let ky = y.bid(AUCTION, 500)?;
    seller.close_auction(AUCTION)?;
    x.reveal_bid(AUCTION, &kx)?;

    // OrgY's own peer still refuses
    assert_eq!(
        auction_err(seller.end_auction(AUCTION)),
        AuctionError::UnrevealedHigherBidExists(ky.clone())
    );
    assert!(seller.auction(AUCTION)?.winner.is_none());

    y.reveal_bid(AUCTION, &ky)?;
    assert_eq!(seller.end_auction(AUCTION)?.bidder, ClientId::new("Y"));

    // a hidden lower bid of a silent organization does not block
    let ledger = MemoryLedger::new();
    configure_peers(&ledger, &["SellerOrg", "OrgX", "OrgY"], LENIENT_AUDIT);
    let seller = crate::support::seller(&ledger);
    let x = bidder(&ledger, "X", "OrgX");
    let y = bidder(&ledger, "Y", "OrgY");
    seller.create_auction(AUCTION, "vase")?;
    let kx = x.bid(AUCTION, 100)?;
    y.bid(AUCTION, 50)?;
    seller.close_auction(AUCTION)?;
    x.reveal_bid(AUCTION, &kx)?;
    assert_eq!(seller.end_auction(AUCTION)?.bidder, ClientId::new("X"));
    Ok(())
}

/// Audit policy belongs to each peer: a lenient seller peer does not relax
/// the checks of the other parties' peers.
#[test]
fn test_audit_policy_is_per_peer() -> anyhow::Result<()> {
    init_tracing();
    let ledger = MemoryLedger::new();
    configure_peers(&ledger, &["SellerOrg"], LENIENT_AUDIT);
    let seller = seller(&ledger);
    let x = bidder(&ledger, "X", "OrgX");
    let y = bidder(&ledger, "Y", "OrgY");

    seller.create_auction(AUCTION, "vase")?;
    let kx = x.bid(AUCTION, 100)?;
    let ky = y.bid(AUCTION, 500)?;
    seller.close_auction(AUCTION)?;
    x.reveal_bid(AUCTION, &kx)?;

    assert_eq!(
        auction_err(seller.end_auction(AUCTION)),
        AuctionError::UnrevealedHigherBidExists(ky)
    );
    assert_eq!(seller.auction(AUCTION)?.status, AuctionStatus::Closed);
    Ok(())
}

/// Client ids are scoped to their organization.
#[test]
fn test_namesake_in_another_org_has_no_rights() -> anyhow::Result<()> {
    init_tracing();
    let ledger = MemoryLedger::new();
    let seller = seller(&ledger);
    let x = bidder(&ledger, "X", "OrgX");
    let fake_seller = bidder(&ledger, "seller", "OrgX");
    let fake_x = bidder(&ledger, "X", "OrgY");

    seller.create_auction(AUCTION, "vase")?;
    let kx = x.bid(AUCTION, 100)?;
    assert_eq!(auction_err(fake_seller.close_auction(AUCTION)), AuctionError::NotSeller);
    assert_eq!(seller.auction(AUCTION)?.status, AuctionStatus::Open);

    seller.close_auction(AUCTION)?;
    let value = x.own_bid(AUCTION, &kx)?;
    assert_eq!(
        auction_err(fake_x.reveal_value(AUCTION, &kx, &value)),
        AuctionError::NotBidOwner
    );
    x.reveal_bid(AUCTION, &kx)?;
    assert_eq!(auction_err(fake_seller.end_auction(AUCTION)), AuctionError::NotSeller);

    assert_eq!(seller.end_auction(AUCTION)?.bidder, ClientId::new("X"));
    Ok(())
}

#[test]
fn test_equal_prices_go_to_first_commitment() -> anyhow::Result<()> {
    init_tracing();
    let ledger = MemoryLedger::new();
    let seller = seller(&ledger);
    let x = bidder(&ledger, "X", "OrgX");
    let y = bidder(&ledger, "Y", "OrgY");

    seller.create_auction(AUCTION, "vase")?;
    let first = y.bid(AUCTION, 75)?;
    let second = x.bid(AUCTION, 75)?;
    seller.close_auction(AUCTION)?;
    x.reveal_bid(AUCTION, &second)?;
    y.reveal_bid(AUCTION, &first)?;

    let winner = seller.end_auction(AUCTION)?;
    assert_eq!(winner.bidder, ClientId::new("Y"));
    assert_eq!(winner.price, 75);
    Ok(())
}

/// The owning organization rewrites a committed bid in its private storage.
#[test]
fn test_tampered_private_bid_is_detected() -> anyhow::Result<()> {
    init_tracing();
    let ledger = MemoryLedger::new();
    let seller = seller(&ledger);
    let x = bidder(&ledger, "X", "OrgX");

    seller.create_auction(AUCTION, "vase")?;
    let k1 = x.bid(AUCTION, 100)?;
    seller.close_auction(AUCTION)?;
    let original = x.own_bid(AUCTION, &k1)?;

    let mut raised = original.clone();
    raised.price = 1_000;
    let identity: Identity = x.identity().clone();
    ledger.submit::<_, AuctionError, _>(&identity, &[identity.org.clone()], |stub| {
        state::put_commitment(stub, &identity.org, &k1, &raised).map(|_| ())
    })?;

    // neither the new nor the original value can be revealed
    assert_eq!(
        auction_err(x.reveal_value(AUCTION, &k1, &raised)),
        AuctionError::CommitmentMismatch(k1.clone())
    );
    assert_eq!(
        auction_err(x.reveal_value(AUCTION, &k1, &original)),
        AuctionError::CommitmentMismatch(k1.clone())
    );
    Ok(())
}
