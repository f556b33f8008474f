//! The cluster client capability
//!
//! [`ClusterClient`] is the full operation set of the control service REST
//! API. [`RemoteClient`](crate::RemoteClient) talks to a real control
//! service; [`MemoryClient`](crate::MemoryClient) keeps everything in
//! process. Both report the same errors for the same conditions, so code
//! and tests can take either as `&dyn ClusterClient`.

use async_trait::async_trait;
use dockyard_common::{
    Container, ContainerState, Dataset, DatasetId, DatasetRequest, DatasetState, DockerImage,
    Lease, Node, NodeId, Result, VersionInfo,
};

#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Version information from the control service
    async fn version(&self) -> Result<VersionInfo>;

    /// Active cluster nodes
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Add a container to the configuration
    ///
    /// Fails with `ContainerAlreadyExists` if the name is taken.
    async fn create_container(
        &self,
        node_uuid: NodeId,
        name: &str,
        image: &DockerImage,
    ) -> Result<Container>;

    /// Containers observed in the cluster
    async fn list_containers_state(&self) -> Result<Vec<ContainerState>>;

    /// Add a dataset to the configuration
    ///
    /// The service picks the dataset ID unless the request carries one.
    /// Fails with `DatasetAlreadyExists` if the ID is taken.
    async fn create_dataset(&self, request: DatasetRequest) -> Result<Dataset>;

    /// Change the node a dataset should manifest on
    ///
    /// Active leases are not consulted.
    async fn move_dataset(&self, primary: NodeId, dataset_id: DatasetId) -> Result<Dataset>;

    /// Remove a dataset from the configuration, returning the removed record
    async fn delete_dataset(&self, dataset_id: DatasetId) -> Result<Dataset>;

    /// Configured datasets, excluding those marked deleted
    async fn list_datasets_configuration(&self) -> Result<Vec<Dataset>>;

    /// Datasets observed in the cluster
    async fn list_datasets_state(&self) -> Result<Vec<DatasetState>>;

    /// Acquire or renew a lease on a dataset for a node
    ///
    /// `expires` is the number of seconds until the lease lapses, `None` for
    /// a lease that never does. Fails with `LeaseAlreadyHeld` if another
    /// node holds an unexpired lease.
    async fn acquire_lease(
        &self,
        dataset_id: DatasetId,
        node_uuid: NodeId,
        expires: Option<f64>,
    ) -> Result<Lease>;

    /// Release the lease on a dataset, returning the released lease
    async fn release_lease(&self, dataset_id: DatasetId) -> Result<Lease>;

    /// Current leases
    async fn list_leases(&self) -> Result<Vec<Lease>>;
}
