//! Application-side flow for sellers and bidders.
//!
//! The client decides which organizations endorse each call. Private bid data
//! is only ever handled by the caller's own organization; writes to an
//! auction record are endorsed by every party of the auction so that each
//! party's peer runs the logic against its own private data.

use rand::rngs::OsRng;
use thiserror::Error;
use tracing::{debug, info};

use auction_crypto::CryptoError;
use auction_ledger::{MemoryLedger, Transaction};
use auction_module::{
    dispatch, handle_query, AuctionCall, AuctionError, AuctionQuery, AuctionQueryResponse,
    CallOutcome,
};
use auction_types::{Auction, BidKey, BidValue, Digest, Identity, OrgId, RevealedBid};

use crate::bid::{create_bid, PreparedBid};

/// Errors returned by [`AuctionClient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Auction(#[from] AuctionError),

    #[error("Bid preparation failed: {0}")]
    Codec(#[from] CryptoError),

    #[error("Unexpected call outcome: {0:?}")]
    UnexpectedOutcome(CallOutcome),

    #[error("Unexpected query response")]
    UnexpectedResponse,
}

impl ClientError {
    /// The auction error behind this failure, if any.
    pub fn auction_error(&self) -> Option<&AuctionError> {
        match self {
            ClientError::Auction(e) => Some(e),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// A participant acting on a shared ledger.
///
/// Endorsing peers run every call with their own installed configuration.
pub struct AuctionClient<'a> {
    ledger: &'a MemoryLedger,
    identity: Identity,
}

impl<'a> AuctionClient<'a> {
    pub fn new(ledger: &'a MemoryLedger, identity: Identity) -> Self {
        Self { ledger, identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Endorse `call` on the peers of `endorsers` without committing it.
    pub fn endorse(
        &self,
        call: &AuctionCall,
        endorsers: &[OrgId],
    ) -> ClientResult<(CallOutcome, Transaction)> {
        let endorsed = self
            .ledger
            .endorse::<_, AuctionError, _>(&self.identity, endorsers, |stub| dispatch(stub, call))?;
        Ok(endorsed)
    }

    /// Endorse and commit `call`.
    pub fn submit(&self, call: &AuctionCall, endorsers: &[OrgId]) -> ClientResult<CallOutcome> {
        let (outcome, tx) = self.endorse(call, endorsers)?;
        let tx_id = tx.tx_id().to_string();
        let endorsements = tx.endorsers().len();
        let height = self.ledger.commit(tx).map_err(AuctionError::from)?;
        debug!(tx_id = %tx_id, height, endorsements, auction_id = %call.auction_id(), "call committed");
        Ok(outcome)
    }

    /// Run a query on our own organization's peer.
    pub fn query(&self, query: &AuctionQuery) -> ClientResult<AuctionQueryResponse> {
        let response = self
            .ledger
            .evaluate::<_, AuctionError, _>(&self.identity, &self.identity.org, |stub| {
                handle_query(stub, query)
            })?;
        Ok(response)
    }

    /// Current public auction record.
    pub fn auction(&self, auction_id: &str) -> ClientResult<Auction> {
        match self.query(&AuctionQuery::GetAuction {
            auction_id: auction_id.to_string(),
        })? {
            AuctionQueryResponse::Auction(auction) => Ok(auction),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// One of our own bids, read back from our private collection.
    pub fn own_bid(&self, auction_id: &str, bid_key: &BidKey) -> ClientResult<BidValue> {
        match self.query(&AuctionQuery::GetBid {
            auction_id: auction_id.to_string(),
            bid_key: bid_key.clone(),
        })? {
            AuctionQueryResponse::Bid(value) => Ok(value),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Organizations that must endorse a write to the auction: every party,
    /// plus our own organization.
    pub fn endorsers_for(&self, auction_id: &str) -> ClientResult<Vec<OrgId>> {
        let mut orgs = self.auction(auction_id)?.parties;
        if !orgs.contains(&self.identity.org) {
            orgs.push(self.identity.org.clone());
        }
        Ok(orgs)
    }

    fn own_org(&self) -> Vec<OrgId> {
        vec![self.identity.org.clone()]
    }

    /// Open a new auction with us as seller.
    pub fn create_auction(&self, auction_id: &str, item: &str) -> ClientResult<()> {
        let call = AuctionCall::CreateAuction {
            auction_id: auction_id.to_string(),
            item: item.to_string(),
        };
        self.submit(&call, &self.own_org())?;
        info!(auction_id = %auction_id, seller = %self.identity, "created auction");
        Ok(())
    }

    /// Store a prepared bid in our private collection. Returns its key.
    pub fn store_bid(&self, auction_id: &str, prepared: &PreparedBid) -> ClientResult<BidKey> {
        let call = AuctionCall::CreateBid {
            auction_id: auction_id.to_string(),
            value: prepared.value.clone(),
        };
        match self.submit(&call, &self.own_org())? {
            CallOutcome::BidCreated(bid_key) => Ok(bid_key),
            other => Err(ClientError::UnexpectedOutcome(other)),
        }
    }

    /// Anchor a stored bid in the auction.
    pub fn submit_commitment(
        &self,
        auction_id: &str,
        bid_key: &BidKey,
        commitment: &Digest,
    ) -> ClientResult<()> {
        let call = AuctionCall::SubmitCommitment {
            auction_id: auction_id.to_string(),
            bid_key: bid_key.clone(),
            commitment: *commitment,
        };
        self.submit(&call, &self.endorsers_for(auction_id)?)?;
        Ok(())
    }

    /// Prepare, store and commit a bid at `price`.
    pub fn bid(&self, auction_id: &str, price: u64) -> ClientResult<BidKey> {
        let prepared = create_bid(&self.identity, price, &mut OsRng)?;
        let bid_key = self.store_bid(auction_id, &prepared)?;
        self.submit_commitment(auction_id, &bid_key, &prepared.commitment)?;
        info!(auction_id = %auction_id, bid_key = %bid_key, bidder = %self.identity, "placed bid");
        Ok(bid_key)
    }

    pub fn close_auction(&self, auction_id: &str) -> ClientResult<()> {
        let call = AuctionCall::CloseAuction {
            auction_id: auction_id.to_string(),
        };
        self.submit(&call, &self.endorsers_for(auction_id)?)?;
        info!(auction_id = %auction_id, "closed auction");
        Ok(())
    }

    /// Reveal one of our bids using the value held in our private collection.
    ///
    /// Returns the best revealed price afterwards.
    pub fn reveal_bid(&self, auction_id: &str, bid_key: &BidKey) -> ClientResult<u64> {
        let value = self.own_bid(auction_id, bid_key)?;
        self.reveal_value(auction_id, bid_key, &value)
    }

    /// Reveal `value` as the cleartext of `bid_key`.
    pub fn reveal_value(
        &self,
        auction_id: &str,
        bid_key: &BidKey,
        value: &BidValue,
    ) -> ClientResult<u64> {
        let call = AuctionCall::RevealBid {
            auction_id: auction_id.to_string(),
            bid_key: bid_key.clone(),
            value: value.clone(),
        };
        match self.submit(&call, &self.endorsers_for(auction_id)?)? {
            CallOutcome::BidRevealed { best_price } => {
                info!(auction_id = %auction_id, bid_key = %bid_key, best_price, "revealed bid");
                Ok(best_price)
            }
            other => Err(ClientError::UnexpectedOutcome(other)),
        }
    }

    /// Finalize the auction. Every party endorses, so every party audits.
    pub fn end_auction(&self, auction_id: &str) -> ClientResult<RevealedBid> {
        let call = AuctionCall::EndAuction {
            auction_id: auction_id.to_string(),
        };
        match self.submit(&call, &self.endorsers_for(auction_id)?)? {
            CallOutcome::AuctionEnded(winner) => {
                info!(auction_id = %auction_id, winner = %winner.bidder, price = winner.price, "ended auction");
                Ok(winner)
            }
            other => Err(ClientError::UnexpectedOutcome(other)),
        }
    }
}
