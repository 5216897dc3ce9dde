//! Deployment configuration for the auction module.
//!
//! This module defines the parameters every peer runs the auction logic with.
//! Each organization installs the document on its own peers; callers never
//! supply it. All endorsing peers must use the same configuration, otherwise
//! their endorsements diverge.

use auction_ledger::Ledger;
use serde::{Deserialize, Serialize};

/// Configuration for the auction module.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionGenesisConfig {
    /// Input size limits
    pub limits: AuctionLimits,

    /// Highest-bid audit policy
    pub audit: AuditConfig,
}

/// Size limits for caller supplied identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionLimits {
    /// Maximum auction id length in bytes
    pub max_auction_id_len: usize,
    /// Maximum item description length in bytes
    pub max_item_len: usize,
}

/// Policy for commitments a peer cannot inspect itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Block finalization on a foreign unrevealed bid whose organization has
    /// revealed nothing in the auction.
    pub block_on_silent_orgs: bool,
}

impl Default for AuctionLimits {
    fn default() -> Self {
        Self {
            max_auction_id_len: 64,
            max_item_len: 256,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            block_on_silent_orgs: true,
        }
    }
}

impl AuctionGenesisConfig {
    /// Parse and validate a JSON configuration document.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, GenesisValidationError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| GenesisValidationError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration installed on the peer executing the transaction.
    ///
    /// Peers without an installed document run with the defaults.
    pub fn for_peer<L: Ledger>(ledger: &L) -> Result<Self, GenesisValidationError> {
        match ledger.peer_config() {
            Some(document) => Self::from_json(document),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        if self.limits.max_auction_id_len == 0 {
            return Err(GenesisValidationError::InvalidLimits(
                "Auction id length limit cannot be zero".into(),
            ));
        }
        if self.limits.max_item_len == 0 {
            return Err(GenesisValidationError::InvalidLimits(
                "Item length limit cannot be zero".into(),
            ));
        }
        Ok(())
    }
}

/// Errors that can occur while loading the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Invalid configuration document: {0}")]
    Parse(String),

    #[error("Invalid limits: {0}")]
    InvalidLimits(String),
}
