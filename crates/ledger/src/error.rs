//! Ledger service error types.

use auction_types::OrgId;
use thiserror::Error;

/// Errors raised by the ledger service while simulating or committing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Read conflict on {0}: state changed since endorsement")]
    MvccConflict(String),

    #[error("Endorsement policy not satisfied for key {key}: missing {missing:?}")]
    EndorsementPolicyFailure { key: String, missing: Vec<OrgId> },

    #[error("Endorsement from {0} does not match the other endorsements")]
    EndorsementMismatch(OrgId),

    #[error("No endorsing organizations given")]
    NoEndorsers,

    #[error("Transaction {0} already committed")]
    DuplicateTransaction(String),
}
