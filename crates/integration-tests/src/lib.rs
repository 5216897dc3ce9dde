//! End-to-end integration tests for the sealed-bid auction system.
//!
//! These tests exercise the full auction lifecycle on one shared
//! [`MemoryLedger`](auction_ledger::MemoryLedger):
//! 1. Auction creation by the seller
//! 2. Private bid storage and commitment
//! 3. Closing
//! 4. Reveals verified against the anchored commitments
//! 5. Per-organization audit and finalization

#[cfg(test)]
mod properties;
