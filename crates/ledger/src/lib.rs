//! Ledger service interface for sealed-bid auctions.
//!
//! The auction logic never talks to a concrete ledger. It runs inside a
//! transaction and sees the ledger through the [`Ledger`] trait:
//!
//! - **Public state**: key/value records readable by every participant
//! - **Private data**: per-organization collections readable only by peers of
//!   that organization, with a public, tamper-evident hash of every entry
//! - **Identity**: the authenticated caller and the organization of the peer
//!   executing the transaction
//! - **Approvers**: per-key sets of organizations that must endorse any later
//!   write to the key
//! - **Peer configuration**: a deployment document installed on each peer by
//!   its organization, out of reach of callers
//!
//! [`MemoryLedger`] is an in-memory implementation with per-organization peers,
//! multi-peer endorsement and first-committer-wins validation at commit time.

use std::collections::BTreeSet;

use auction_types::{Digest, Identity, OrgId};

pub mod error;
pub mod memory;

pub use error::LedgerError;
pub use memory::{MemoryLedger, StateKey, Stub, Transaction};

/// Transaction-scoped view of the ledger service.
///
/// Reads take `&mut self` because every read is recorded for validation at
/// commit time. Writes are buffered and only become visible to other callers
/// once the whole transaction commits.
pub trait Ledger {
    /// Id of the transaction being executed.
    fn tx_id(&self) -> &str;

    /// Organization of the peer executing the transaction.
    fn local_org(&self) -> &OrgId;

    /// Configuration document installed on the executing peer, if any.
    fn peer_config(&self) -> Option<&str>;

    /// Authenticated identity of the caller.
    fn caller_identity(&self) -> Result<Identity, LedgerError>;

    /// Read a public record.
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Write a public record.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Read from `org`'s private collection. Only peers of `org` may do so.
    fn get_private(&mut self, org: &OrgId, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Write to `org`'s private collection. Only peers of `org` may do so.
    fn put_private(&mut self, org: &OrgId, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Public hash of the value stored in `org`'s private collection under `key`.
    fn private_commitment_ref(&mut self, org: &OrgId, key: &str) -> Result<Option<Digest>, LedgerError>;

    /// Organizations whose endorsement is required to write `key`.
    fn approvers(&mut self, key: &str) -> Result<BTreeSet<OrgId>, LedgerError>;

    /// Replace the approver set of `key`.
    fn set_approvers(&mut self, key: &str, orgs: BTreeSet<OrgId>) -> Result<(), LedgerError>;

    /// Add one organization to the approver set of `key`.
    fn add_approver(&mut self, key: &str, org: &OrgId) -> Result<(), LedgerError> {
        let mut orgs = self.approvers(key)?;
        if orgs.insert(org.clone()) {
            self.set_approvers(key, orgs)?;
        }
        Ok(())
    }
}
