//! In-memory ledger with per-organization peers.
//!
//! Transactions follow an endorse-then-commit flow:
//!
//! 1. Each endorsing organization's peer simulates the operation against the
//!    same committed snapshot, producing a read set (key -> version) and a
//!    buffered write set.
//! 2. All endorsements must produce identical write sets.
//! 3. Commit validates, under the write lock, that every read version is still
//!    current (first committer wins) and that every written key's existing
//!    approver set is covered by the endorsing organizations.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use auction_types::{Digest, Identity, OrgId};
use parking_lot::RwLock;
use sha2::{Digest as _, Sha256};
use tracing::{debug, info, warn};

use crate::{Ledger, LedgerError};

/// Address of a versioned entry in the world state.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StateKey {
    Public(String),
    Private(OrgId, String),
    Approvers(String),
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKey::Public(key) => write!(f, "public:{}", key.escape_debug()),
            StateKey::Private(org, key) => write!(f, "private:{org}:{}", key.escape_debug()),
            StateKey::Approvers(key) => write!(f, "approvers:{}", key.escape_debug()),
        }
    }
}

#[derive(Debug)]
struct Versioned<T> {
    version: u64,
    value: T,
}

/// Committed state shared by all peers.
#[derive(Debug, Default)]
struct WorldState {
    height: u64,
    records: BTreeMap<StateKey, Versioned<Vec<u8>>>,
    approvers: BTreeMap<String, Versioned<BTreeSet<OrgId>>>,
    committed: HashSet<String>,
}

impl WorldState {
    fn version_of(&self, key: &StateKey) -> Option<u64> {
        match key {
            StateKey::Approvers(k) => self.approvers.get(k).map(|v| v.version),
            _ => self.records.get(key).map(|v| v.version),
        }
    }

    fn check_policy(&self, key: &str, endorsers: &BTreeSet<OrgId>) -> Result<(), LedgerError> {
        if let Some(required) = self.approvers.get(key) {
            let missing: Vec<OrgId> = required.value.difference(endorsers).cloned().collect();
            if !missing.is_empty() {
                return Err(LedgerError::EndorsementPolicyFailure {
                    key: key.escape_debug().to_string(),
                    missing,
                });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ReadWriteSet {
    reads: BTreeMap<StateKey, Option<u64>>,
    writes: BTreeMap<StateKey, Vec<u8>>,
    approver_writes: BTreeMap<String, BTreeSet<OrgId>>,
}

impl ReadWriteSet {
    fn same_writes(&self, other: &ReadWriteSet) -> bool {
        self.writes == other.writes && self.approver_writes == other.approver_writes
    }

    fn merge_reads(&mut self, other: ReadWriteSet) {
        for (key, version) in other.reads {
            self.reads.entry(key).or_insert(version);
        }
    }
}

/// An endorsed transaction waiting to be committed.
#[derive(Clone, Debug)]
pub struct Transaction {
    tx_id: String,
    endorsers: BTreeSet<OrgId>,
    rwset: ReadWriteSet,
}

impl Transaction {
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    pub fn endorsers(&self) -> &BTreeSet<OrgId> {
        &self.endorsers
    }
}

/// Simulation context handed to an operation on one peer.
pub struct Stub<'a> {
    world: &'a WorldState,
    tx_id: &'a str,
    caller: &'a Identity,
    local_org: &'a OrgId,
    config: Option<&'a str>,
    rwset: ReadWriteSet,
}

impl<'a> Stub<'a> {
    fn new(
        world: &'a WorldState,
        tx_id: &'a str,
        caller: &'a Identity,
        local_org: &'a OrgId,
        config: Option<&'a str>,
    ) -> Self {
        Self {
            world,
            tx_id,
            caller,
            local_org,
            config,
            rwset: ReadWriteSet::default(),
        }
    }

    fn read(&mut self, key: StateKey) -> Option<Vec<u8>> {
        if let Some(pending) = self.rwset.writes.get(&key) {
            return Some(pending.clone());
        }
        let world = self.world;
        let record = world.records.get(&key);
        self.rwset
            .reads
            .entry(key)
            .or_insert(record.map(|r| r.version));
        record.map(|r| r.value.clone())
    }

    fn require_local(&self, org: &OrgId, action: &str) -> Result<(), LedgerError> {
        if org != self.local_org {
            return Err(LedgerError::NotAuthorized(format!(
                "peer of {} cannot {action} private data of {org}",
                self.local_org
            )));
        }
        Ok(())
    }

    fn into_rwset(self) -> ReadWriteSet {
        self.rwset
    }
}

impl Ledger for Stub<'_> {
    fn tx_id(&self) -> &str {
        self.tx_id
    }

    fn local_org(&self) -> &OrgId {
        self.local_org
    }

    fn peer_config(&self) -> Option<&str> {
        self.config
    }

    fn caller_identity(&self) -> Result<Identity, LedgerError> {
        Ok(self.caller.clone())
    }

    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.read(StateKey::Public(key.to_string())))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        self.rwset
            .writes
            .insert(StateKey::Public(key.to_string()), value);
        Ok(())
    }

    fn get_private(&mut self, org: &OrgId, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        self.require_local(org, "read")?;
        Ok(self.read(StateKey::Private(org.clone(), key.to_string())))
    }

    fn put_private(&mut self, org: &OrgId, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        self.require_local(org, "write")?;
        self.rwset
            .writes
            .insert(StateKey::Private(org.clone(), key.to_string()), value);
        Ok(())
    }

    fn private_commitment_ref(&mut self, org: &OrgId, key: &str) -> Result<Option<Digest>, LedgerError> {
        let value = self.read(StateKey::Private(org.clone(), key.to_string()));
        Ok(value.map(|v| Digest::of(&v)))
    }

    fn approvers(&mut self, key: &str) -> Result<BTreeSet<OrgId>, LedgerError> {
        if let Some(pending) = self.rwset.approver_writes.get(key) {
            return Ok(pending.clone());
        }
        let world = self.world;
        let current = world.approvers.get(key);
        self.rwset
            .reads
            .entry(StateKey::Approvers(key.to_string()))
            .or_insert(current.map(|v| v.version));
        Ok(current.map(|v| v.value.clone()).unwrap_or_default())
    }

    fn set_approvers(&mut self, key: &str, orgs: BTreeSet<OrgId>) -> Result<(), LedgerError> {
        self.rwset.approver_writes.insert(key.to_string(), orgs);
        Ok(())
    }
}

/// In-memory ledger shared by every organization's peer.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    world: RwLock<WorldState>,
    peer_configs: RwLock<BTreeMap<OrgId, String>>,
    tx_counter: AtomicU64,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `document` as the configuration of `org`'s peer, replacing any
    /// previous one. Later endorsements on that peer see it through
    /// [`Ledger::peer_config`].
    pub fn configure_peer(&self, org: &OrgId, document: impl Into<String>) {
        self.peer_configs.write().insert(org.clone(), document.into());
        info!(peer = %org, "peer configuration installed");
    }

    fn next_tx_id(&self, caller: &Identity) -> String {
        let nonce = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Sha256::new();
        hasher.update(b"TX_ID_V1:");
        hasher.update(nonce.to_le_bytes());
        hasher.update(caller.org.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(caller.id.as_str().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Simulate `op` on the peer of every organization in `endorsers`.
    ///
    /// Returns the result of the first endorsement together with the endorsed
    /// transaction. Nothing is visible to other callers until [`commit`].
    ///
    /// [`commit`]: MemoryLedger::commit
    pub fn endorse<T, E, F>(
        &self,
        caller: &Identity,
        endorsers: &[OrgId],
        mut op: F,
    ) -> Result<(T, Transaction), E>
    where
        F: FnMut(&mut Stub<'_>) -> Result<T, E>,
        E: From<LedgerError>,
    {
        let endorsing: BTreeSet<OrgId> = endorsers.iter().cloned().collect();
        if endorsing.is_empty() {
            return Err(LedgerError::NoEndorsers.into());
        }

        let tx_id = self.next_tx_id(caller);
        let world = self.world.read();
        let configs = self.peer_configs.read();
        let mut outcome: Option<(T, ReadWriteSet)> = None;

        for org in &endorsing {
            let config = configs.get(org).map(String::as_str);
            let mut stub = Stub::new(&world, &tx_id, caller, org, config);
            let value = match op(&mut stub) {
                Ok(value) => value,
                Err(e) => {
                    debug!(tx_id = %tx_id, peer = %org, "endorsement rejected");
                    return Err(e);
                }
            };
            let rwset = stub.into_rwset();
            match outcome.as_mut() {
                None => outcome = Some((value, rwset)),
                Some((_, first)) => {
                    if !first.same_writes(&rwset) {
                        warn!(tx_id = %tx_id, peer = %org, "endorsement write sets differ");
                        return Err(LedgerError::EndorsementMismatch(org.clone()).into());
                    }
                    first.merge_reads(rwset);
                }
            }
        }

        let (value, rwset) = outcome.ok_or_else(|| E::from(LedgerError::NoEndorsers))?;
        Ok((
            value,
            Transaction {
                tx_id,
                endorsers: endorsing,
                rwset,
            },
        ))
    }

    /// Validate and apply an endorsed transaction. Returns the new height.
    pub fn commit(&self, tx: Transaction) -> Result<u64, LedgerError> {
        let mut world = self.world.write();

        if world.committed.contains(&tx.tx_id) {
            return Err(LedgerError::DuplicateTransaction(tx.tx_id));
        }

        for (key, version) in &tx.rwset.reads {
            if world.version_of(key) != *version {
                warn!(tx_id = %tx.tx_id, key = %key, "read conflict, transaction invalidated");
                return Err(LedgerError::MvccConflict(key.to_string()));
            }
        }

        for key in tx.rwset.writes.keys() {
            if let StateKey::Public(k) = key {
                world.check_policy(k, &tx.endorsers)?;
            }
        }
        for key in tx.rwset.approver_writes.keys() {
            world.check_policy(key, &tx.endorsers)?;
        }

        world.height += 1;
        let version = world.height;
        for (key, value) in tx.rwset.writes {
            world.records.insert(key, Versioned { version, value });
        }
        for (key, value) in tx.rwset.approver_writes {
            world.approvers.insert(key, Versioned { version, value });
        }
        world.committed.insert(tx.tx_id.clone());

        info!(tx_id = %tx.tx_id, height = version, "transaction committed");
        Ok(version)
    }

    /// Endorse on `endorsers` and commit in one step.
    pub fn submit<T, E, F>(&self, caller: &Identity, endorsers: &[OrgId], op: F) -> Result<T, E>
    where
        F: FnMut(&mut Stub<'_>) -> Result<T, E>,
        E: From<LedgerError>,
    {
        let (value, tx) = self.endorse(caller, endorsers, op)?;
        self.commit(tx)?;
        Ok(value)
    }

    /// Run a read-only operation on the peer of `peer`. Nothing is committed.
    pub fn evaluate<T, E, F>(&self, caller: &Identity, peer: &OrgId, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut Stub<'_>) -> Result<T, E>,
    {
        let tx_id = self.next_tx_id(caller);
        let world = self.world.read();
        let configs = self.peer_configs.read();
        let mut stub = Stub::new(&world, &tx_id, caller, peer, configs.get(peer).map(String::as_str));
        op(&mut stub)
    }

    /// Number of committed transactions.
    pub fn height(&self) -> u64 {
        self.world.read().height
    }

    /// Committed approver set of `key`.
    pub fn committed_approvers(&self, key: &str) -> BTreeSet<OrgId> {
        self.world
            .read()
            .approvers
            .get(key)
            .map(|v| v.value.clone())
            .unwrap_or_default()
    }
}
