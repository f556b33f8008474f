//! In-memory cluster client
//!
//! [`MemoryClient`] keeps the configuration and a lease ledger in process
//! and answers every operation the way the control service would, so tests
//! and local tools can run without a cluster.
//!
//! Differences from a real cluster:
//! - Observed state is rebuilt from configuration after every mutation.
//!   A real cluster converges asynchronously; here dataset and container
//!   state always mirror configuration exactly.
//! - Time does not pass. Every lease operation happens at the same fixed
//!   instant, so leases never lapse on their own.

use crate::client::ClusterClient;
use crate::lease::{absolute_expiry, lease_from_entry};
use crate::ledger::{LeaseLedger, MemoryLedger};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dockyard_common::{
    Container, ContainerState, Dataset, DatasetId, DatasetRequest, DatasetState, DockerImage,
    Error, Lease, Node, NodeId, Result, VersionInfo,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use tracing::{debug, warn};

/// The instant every lease operation is evaluated at
const NOW: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Directory synthesized mount paths live under
pub const MOUNT_ROOT: &str = "/dockyard";

/// Number of nodes a default client starts with
const DEFAULT_NODES: u8 = 2;

struct Stores<L> {
    datasets: BTreeMap<DatasetId, Dataset>,
    containers: BTreeMap<String, Container>,
    leases: L,
    dataset_state: Vec<DatasetState>,
    container_state: Vec<ContainerState>,
}

impl<L> Stores<L> {
    /// Copy configuration into state
    fn synchronize_state(&mut self) {
        self.dataset_state = self
            .datasets
            .values()
            .map(|dataset| DatasetState {
                dataset_id: dataset.dataset_id,
                primary: Some(dataset.primary),
                maximum_size: dataset.maximum_size,
                path: Some(Path::new(MOUNT_ROOT).join(dataset.dataset_id.to_string())),
            })
            .collect();
        self.container_state = self
            .containers
            .values()
            .cloned()
            .map(ContainerState::from)
            .collect();
    }
}

/// Cluster client holding everything in memory
pub struct MemoryClient<L = MemoryLedger> {
    nodes: Vec<Node>,
    stores: Mutex<Stores<L>>,
}

impl MemoryClient {
    /// Create a client with two nodes on 10.0.0.0/8
    #[must_use]
    pub fn new() -> Self {
        let nodes = (0..DEFAULT_NODES)
            .map(|i| Node {
                uuid: NodeId::new(),
                public_address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, i)),
            })
            .collect();
        Self::with_nodes(nodes)
    }

    /// Create a client reporting the given nodes
    #[must_use]
    pub fn with_nodes(nodes: Vec<Node>) -> Self {
        Self::with_ledger(nodes, MemoryLedger::new())
    }
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: LeaseLedger> MemoryClient<L> {
    /// Create a client recording leases in `ledger`
    pub fn with_ledger(nodes: Vec<Node>, ledger: L) -> Self {
        let mut stores = Stores {
            datasets: BTreeMap::new(),
            containers: BTreeMap::new(),
            leases: ledger,
            dataset_state: Vec::new(),
            container_state: Vec::new(),
        };
        stores.synchronize_state();
        Self {
            nodes,
            stores: Mutex::new(stores),
        }
    }

    /// Nodes this client reports
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

#[async_trait]
impl<L: LeaseLedger + 'static> ClusterClient for MemoryClient<L> {
    async fn version(&self) -> Result<VersionInfo> {
        Ok(VersionInfo::from([(
            "dockyard".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        )]))
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        Ok(self.nodes.clone())
    }

    async fn create_container(
        &self,
        node_uuid: NodeId,
        name: &str,
        image: &DockerImage,
    ) -> Result<Container> {
        let mut stores = self.stores.lock();
        if stores.containers.contains_key(name) {
            warn!("Container name {} already in use", name);
            return Err(Error::ContainerAlreadyExists(name.to_string()));
        }
        let container = Container {
            node_uuid,
            name: name.to_string(),
            image: image.clone(),
        };
        stores
            .containers
            .insert(container.name.clone(), container.clone());
        stores.synchronize_state();
        debug!("Created container {} on node {}", name, node_uuid);
        Ok(container)
    }

    async fn list_containers_state(&self) -> Result<Vec<ContainerState>> {
        Ok(self.stores.lock().container_state.clone())
    }

    async fn create_dataset(&self, request: DatasetRequest) -> Result<Dataset> {
        let mut stores = self.stores.lock();
        // The service generates IDs; here we have to do it ourselves
        let dataset_id = request.dataset_id.unwrap_or_default();
        if stores.datasets.contains_key(&dataset_id) {
            warn!("Dataset {} already exists", dataset_id);
            return Err(Error::DatasetAlreadyExists(dataset_id.to_string()));
        }
        let dataset = Dataset {
            dataset_id,
            primary: request.primary,
            maximum_size: request.maximum_size,
            metadata: request.metadata,
        };
        stores.datasets.insert(dataset_id, dataset.clone());
        stores.synchronize_state();
        debug!("Created dataset {} on node {}", dataset_id, dataset.primary);
        Ok(dataset)
    }

    async fn move_dataset(&self, primary: NodeId, dataset_id: DatasetId) -> Result<Dataset> {
        let mut stores = self.stores.lock();
        let Some(existing) = stores.datasets.get(&dataset_id) else {
            warn!("Cannot move unknown dataset {}", dataset_id);
            return Err(Error::DatasetNotFound(dataset_id.to_string()));
        };
        let moved = Dataset {
            primary,
            ..existing.clone()
        };
        stores.datasets.insert(dataset_id, moved.clone());
        stores.synchronize_state();
        debug!("Moved dataset {} to node {}", dataset_id, primary);
        Ok(moved)
    }

    async fn delete_dataset(&self, dataset_id: DatasetId) -> Result<Dataset> {
        let mut stores = self.stores.lock();
        let Some(removed) = stores.datasets.remove(&dataset_id) else {
            warn!("Cannot delete unknown dataset {}", dataset_id);
            return Err(Error::DatasetNotFound(dataset_id.to_string()));
        };
        stores.synchronize_state();
        debug!("Deleted dataset {}", dataset_id);
        Ok(removed)
    }

    async fn list_datasets_configuration(&self) -> Result<Vec<Dataset>> {
        Ok(self.stores.lock().datasets.values().cloned().collect())
    }

    async fn list_datasets_state(&self) -> Result<Vec<DatasetState>> {
        Ok(self.stores.lock().dataset_state.clone())
    }

    async fn acquire_lease(
        &self,
        dataset_id: DatasetId,
        node_uuid: NodeId,
        expires: Option<f64>,
    ) -> Result<Lease> {
        let expiration = absolute_expiry(NOW, expires)?;
        let entry = self
            .stores
            .lock()
            .leases
            .acquire(NOW, dataset_id, node_uuid, expiration)
            .inspect_err(|e| warn!("Lease acquisition refused: {}", e))?;
        debug!("Node {} holds lease on dataset {}", node_uuid, dataset_id);
        Ok(lease_from_entry(NOW, &entry))
    }

    async fn release_lease(&self, dataset_id: DatasetId) -> Result<Lease> {
        let mut stores = self.stores.lock();
        let Some(existing) = stores.leases.get(dataset_id) else {
            warn!("Cannot release missing lease on dataset {}", dataset_id);
            return Err(Error::LeaseNotFound(dataset_id.to_string()));
        };
        let released = stores.leases.release(dataset_id, existing.node_id)?;
        debug!("Released lease on dataset {}", dataset_id);
        Ok(lease_from_entry(NOW, &released))
    }

    async fn list_leases(&self) -> Result<Vec<Lease>> {
        Ok(self
            .stores
            .lock()
            .leases
            .entries()
            .iter()
            .map(|entry| lease_from_entry(NOW, entry))
            .collect())
    }
}
