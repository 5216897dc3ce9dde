//! Core type definitions for sealed-bid ledger auctions.
//!
//! This crate provides the shared data structures used across the auction system:
//! participant identities, bid keys, the `Auction` aggregate and the records it
//! holds for committed and revealed bids.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use std::collections::BTreeMap;
use std::fmt;

// =========================
// IDENTITIES
// =========================

/// Organization identifier (the unit of storage isolation and endorsement).
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OrgId(pub String);

impl OrgId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated client (bidder or seller) identifier.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the caller of a transaction, as attested by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: ClientId,
    pub org: OrgId,
}

impl Identity {
    pub fn new(id: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            id: ClientId::new(id),
            org: OrgId::new(org),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.org)
    }
}

// =========================
// DIGESTS AND KEYS
// =========================

/// SHA-256 digest, hex encoded in human-readable formats.
#[serde_as]
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Digest(#[serde_as(as = "Hex")] pub [u8; 32]);

impl Digest {
    /// Digest of arbitrary bytes.
    pub fn of(data: &[u8]) -> Self {
        Self(sha256(data))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Key identifying one bid-submission event.
///
/// Built from the auction id and the id of the transaction that stored the
/// bid, so it is unique across every bid ever made in the auction.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BidKey(pub String);

impl BidKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BidKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Composite keys use NUL separators; print them readably.
        f.write_str(&self.0.trim_matches(KEY_SEPARATOR).replace(KEY_SEPARATOR, "/"))
    }
}

/// Object type prefix of bid composite keys.
pub const BID_KEY_TYPE: &str = "bid";

const KEY_SEPARATOR: char = '\u{0}';

/// Compute the composite key of a bid from its auction and transaction ids.
///
/// Returns `None` if either component is empty or contains the key separator.
pub fn compute_bid_key(auction_id: &str, tx_id: &str) -> Option<BidKey> {
    let valid = |s: &str| !s.is_empty() && !s.contains(KEY_SEPARATOR);
    if !valid(auction_id) || !valid(tx_id) {
        return None;
    }
    Some(BidKey(format!(
        "{sep}{BID_KEY_TYPE}{sep}{auction_id}{sep}{tx_id}{sep}",
        sep = KEY_SEPARATOR
    )))
}

/// Split a bid composite key back into `(auction_id, tx_id)`.
pub fn parse_bid_key(key: &BidKey) -> Option<(&str, &str)> {
    let inner = key
        .0
        .strip_prefix(KEY_SEPARATOR)?
        .strip_suffix(KEY_SEPARATOR)?;
    let mut parts = inner.split(KEY_SEPARATOR);
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(BID_KEY_TYPE), Some(auction_id), Some(tx_id), None)
            if !auction_id.is_empty() && !tx_id.is_empty() =>
        {
            Some((auction_id, tx_id))
        }
        _ => None,
    }
}

/// Anchor reference of a bid: a digest of its key, not of its value.
pub fn key_digest(bid_key: &BidKey) -> Digest {
    use sha2::{Digest as _, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"BID_KEY_REF_V1:");
    hasher.update(bid_key.0.as_bytes());
    Digest(hasher.finalize().into())
}

// =========================
// BIDS
// =========================

/// Random blinding value mixed into every bid.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Salt(#[serde_as(as = "Hex")] pub [u8; 32]);

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Salt(..)")
    }
}

/// Cleartext bid, kept in the bidder organization's private storage until reveal.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BidValue {
    pub price: u64,
    pub org: OrgId,
    pub bidder: ClientId,
    pub salt: Salt,
}

/// Public record that a bid was committed to an auction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidCommitment {
    /// Organization whose private storage holds the bid
    pub org: OrgId,
    /// Identity that submitted the commitment
    pub submitter: Identity,
    /// Digest of the bid key; proves a bid is anchored under this key
    pub commitment_ref: Digest,
    /// Ledger hash of the stored bid value at submission time
    pub anchored: Digest,
    /// Insertion order within the auction
    pub sequence: u64,
}

/// A bid whose reveal has been verified against its commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedBid {
    pub price: u64,
    pub org: OrgId,
    pub bidder: ClientId,
}

// =========================
// AUCTION
// =========================

/// Auction lifecycle status. Only ever moves forward.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    /// Accepting bid commitments
    Open,
    /// Commitments locked, accepting reveals
    Closed,
    /// Winner determined
    Ended,
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuctionStatus::Open => "open",
            AuctionStatus::Closed => "closed",
            AuctionStatus::Ended => "ended",
        };
        f.write_str(s)
    }
}

/// Public auction record stored on the shared ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub auction_id: String,
    pub item: String,
    pub seller: Identity,
    pub status: AuctionStatus,
    pub parties: Vec<OrgId>,
    pub commitments: BTreeMap<BidKey, BidCommitment>,
    pub revealed: BTreeMap<BidKey, RevealedBid>,
    pub best_price: u64,
    pub winner: Option<ClientId>,
}

impl Auction {
    /// Create a freshly opened auction owned by `seller`.
    pub fn new(auction_id: impl Into<String>, item: impl Into<String>, seller: &Identity) -> Self {
        Self {
            auction_id: auction_id.into(),
            item: item.into(),
            seller: seller.clone(),
            status: AuctionStatus::Open,
            parties: vec![seller.org.clone()],
            commitments: BTreeMap::new(),
            revealed: BTreeMap::new(),
            best_price: 0,
            winner: None,
        }
    }

    pub fn has_party(&self, org: &OrgId) -> bool {
        self.parties.contains(org)
    }

    /// Add an organization to the parties. Returns `true` if it was new.
    pub fn add_party(&mut self, org: &OrgId) -> bool {
        if self.has_party(org) {
            return false;
        }
        self.parties.push(org.clone());
        true
    }

    /// Sequence number the next commitment will receive.
    pub fn next_sequence(&self) -> u64 {
        self.commitments.len() as u64
    }

    /// Commitments without a verified reveal, in commitment order.
    pub fn unrevealed(&self) -> Vec<(&BidKey, &BidCommitment)> {
        let mut pending: Vec<_> = self
            .commitments
            .iter()
            .filter(|(key, _)| !self.revealed.contains_key(*key))
            .collect();
        pending.sort_by_key(|(_, c)| c.sequence);
        pending
    }

    /// Whether `org` has revealed at least one bid.
    pub fn org_has_revealed(&self, org: &OrgId) -> bool {
        self.revealed.values().any(|bid| &bid.org == org)
    }

    /// Highest revealed bid. Equal prices go to the earliest commitment.
    pub fn highest_revealed(&self) -> Option<(&BidKey, &RevealedBid)> {
        let sequence = |key: &BidKey| {
            self.commitments
                .get(key)
                .map(|c| c.sequence)
                .unwrap_or(u64::MAX)
        };
        self.revealed.iter().fold(None, |best, (key, bid)| match best {
            Some((best_key, best_bid)) => {
                let better = bid.price > best_bid.price
                    || (bid.price == best_bid.price && sequence(key) < sequence(best_key));
                if better {
                    Some((key, bid))
                } else {
                    Some((best_key, best_bid))
                }
            }
            None => Some((key, bid)),
        })
    }
}

// =========================
// HELPER FUNCTIONS
// =========================

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest as _, Sha256};
    Sha256::digest(data).into()
}
