//! Lease ledger
//!
//! The ledger records which node holds each dataset's lease and until when.
//! The control service owns the authoritative ledger; [`MemoryLedger`] is
//! the in-process version the reference client keeps.

use chrono::{DateTime, Utc};
use dockyard_common::{DatasetId, NodeId};
use std::collections::BTreeMap;
use thiserror::Error;

/// Ledger-level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("lease on dataset {dataset_id} is held by node {holder}")]
    Conflict { dataset_id: DatasetId, holder: NodeId },

    #[error("no lease on dataset {0}")]
    NotFound(DatasetId),

    #[error("lease on dataset {dataset_id} is held by node {holder}, not {requester}")]
    WrongNode {
        dataset_id: DatasetId,
        holder: NodeId,
        requester: NodeId,
    },
}

/// A ledger entry: who holds a dataset and when that ends
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeaseEntry {
    pub dataset_id: DatasetId,
    pub node_id: NodeId,
    /// Absolute expiry, `None` if the lease never expires
    pub expiration: Option<DateTime<Utc>>,
}

impl LeaseEntry {
    /// Whether the lease still binds at `now`
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_none_or(|expiration| expiration > now)
    }
}

/// Operations a lease store provides
pub trait LeaseLedger: Send {
    /// Grant or renew a lease
    ///
    /// Fails with [`LedgerError::Conflict`] if a different node holds an
    /// unexpired lease on the dataset. The same node acquiring again
    /// replaces its expiry.
    fn acquire(
        &mut self,
        now: DateTime<Utc>,
        dataset_id: DatasetId,
        node_id: NodeId,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<LeaseEntry, LedgerError>;

    /// Remove the lease `node_id` holds on the dataset
    fn release(&mut self, dataset_id: DatasetId, node_id: NodeId)
    -> Result<LeaseEntry, LedgerError>;

    /// Look up the lease on a dataset
    fn get(&self, dataset_id: DatasetId) -> Option<LeaseEntry>;

    /// All recorded leases, ordered by dataset ID
    fn entries(&self) -> Vec<LeaseEntry>;
}

/// In-memory lease ledger
#[derive(Debug, Default)]
pub struct MemoryLedger {
    leases: BTreeMap<DatasetId, LeaseEntry>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeaseLedger for MemoryLedger {
    fn acquire(
        &mut self,
        now: DateTime<Utc>,
        dataset_id: DatasetId,
        node_id: NodeId,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<LeaseEntry, LedgerError> {
        if let Some(existing) = self.leases.get(&dataset_id) {
            if existing.node_id != node_id && existing.is_active(now) {
                return Err(LedgerError::Conflict {
                    dataset_id,
                    holder: existing.node_id,
                });
            }
        }
        let entry = LeaseEntry {
            dataset_id,
            node_id,
            expiration,
        };
        self.leases.insert(dataset_id, entry);
        Ok(entry)
    }

    fn release(
        &mut self,
        dataset_id: DatasetId,
        node_id: NodeId,
    ) -> Result<LeaseEntry, LedgerError> {
        let existing = self
            .leases
            .get(&dataset_id)
            .ok_or(LedgerError::NotFound(dataset_id))?;
        if existing.node_id != node_id {
            return Err(LedgerError::WrongNode {
                dataset_id,
                holder: existing.node_id,
                requester: node_id,
            });
        }
        self.leases
            .remove(&dataset_id)
            .ok_or(LedgerError::NotFound(dataset_id))
    }

    fn get(&self, dataset_id: DatasetId) -> Option<LeaseEntry> {
        self.leases.get(&dataset_id).copied()
    }

    fn entries(&self) -> Vec<LeaseEntry> {
        self.leases.values().copied().collect()
    }
}
