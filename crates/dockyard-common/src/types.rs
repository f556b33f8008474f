//! Core type definitions for dockyard
//!
//! Configuration records (`Container`, `Dataset`, `Lease`) describe what the
//! cluster has been asked to do; state records (`ContainerState`,
//! `DatasetState`) describe what it has observed. All of them are plain
//! values: uniqueness and lease exclusivity are enforced by whichever store
//! holds them, never by the records themselves.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::num::NonZeroU64;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

/// Free-form dataset metadata
pub type Metadata = BTreeMap<String, String>;

/// Version information reported by the control service
pub type VersionInfo = BTreeMap<String, String>;

/// Unique identifier for a cluster node
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, From, Into)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generate a new random node ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a dataset
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, From, Into)]
pub struct DatasetId(Uuid);

impl DatasetId {
    /// Generate a new random dataset ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DatasetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DatasetId({})", self.0)
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member of the cluster
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Node identity
    pub uuid: NodeId,
    /// Address other members reach the node at (IPv4 or IPv6)
    #[serde(rename = "host")]
    pub public_address: IpAddr,
}

const DEFAULT_TAG: &str = "latest";

/// Reference to a container image, `repository[:tag]`
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(try_from = "String", into = "String")]
#[display("{repository}:{tag}")]
pub struct DockerImage {
    repository: String,
    tag: String,
}

impl DockerImage {
    /// Create an image reference from its parts
    pub fn new(
        repository: impl Into<String>,
        tag: impl Into<String>,
    ) -> Result<Self, ImageError> {
        let repository = repository.into();
        let tag = tag.into();
        if repository.is_empty() {
            return Err(ImageError::EmptyRepository);
        }
        if tag.is_empty() {
            return Err(ImageError::EmptyTag);
        }
        Ok(Self { repository, tag })
    }

    /// Repository part, including any registry prefix
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Tag part
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl FromStr for DockerImage {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A colon followed by a path is a registry port, not a tag.
        match s.rfind(':') {
            Some(idx) if !s[idx + 1..].contains('/') => Self::new(&s[..idx], &s[idx + 1..]),
            _ => Self::new(s, DEFAULT_TAG),
        }
    }
}

impl TryFrom<String> for DockerImage {
    type Error = ImageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DockerImage> for String {
    fn from(image: DockerImage) -> Self {
        image.to_string()
    }
}

impl fmt::Debug for DockerImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DockerImage({self})")
    }
}

/// Errors that can occur when parsing an image reference
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("image repository cannot be empty")]
    EmptyRepository,
    #[error("image tag cannot be empty")]
    EmptyTag,
}

/// A container in the configuration
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Container {
    /// Node the container should run on
    pub node_uuid: NodeId,
    /// Cluster-unique container name
    pub name: String,
    /// Image the container runs
    pub image: DockerImage,
}

/// A container observed running in the cluster
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerState {
    pub node_uuid: NodeId,
    pub name: String,
    pub image: DockerImage,
}

impl From<Container> for ContainerState {
    fn from(container: Container) -> Self {
        Self {
            node_uuid: container.node_uuid,
            name: container.name,
            image: container.image,
        }
    }
}

/// A dataset in the configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset identity
    pub dataset_id: DatasetId,
    /// Node where the dataset should manifest
    pub primary: NodeId,
    /// Requested size in bytes, `None` if no particular size was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_size: Option<NonZeroU64>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// The observed state of a dataset in the cluster
///
/// `primary` and `path` stay `None` until the dataset has manifested
/// somewhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetState {
    pub dataset_id: DatasetId,
    /// Node where the dataset is manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_size: Option<NonZeroU64>,
    /// Filesystem path where the dataset is mounted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// A lease on a dataset
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lease {
    /// The dataset the lease applies to
    pub dataset_id: DatasetId,
    /// The node holding the lease
    pub node_uuid: NodeId,
    /// Seconds until the lease expires, `None` if it never does
    #[serde(default)]
    pub expires: Option<f64>,
}

/// Input for creating a dataset
///
/// Serializes to the request body of the dataset creation endpoint: the id
/// and size are left out entirely when unset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRequest {
    pub primary: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_size: Option<NonZeroU64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<DatasetId>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl DatasetRequest {
    /// Request a dataset on `primary` with no size limit and no metadata
    #[must_use]
    pub fn new(primary: NodeId) -> Self {
        Self {
            primary,
            maximum_size: None,
            dataset_id: None,
            metadata: Metadata::new(),
        }
    }

    /// Set the requested maximum size
    #[must_use]
    pub const fn with_maximum_size(mut self, maximum_size: NonZeroU64) -> Self {
        self.maximum_size = Some(maximum_size);
        self
    }

    /// Use a caller-chosen dataset ID instead of a generated one
    #[must_use]
    pub const fn with_dataset_id(mut self, dataset_id: DatasetId) -> Self {
        self.dataset_id = Some(dataset_id);
        self
    }

    /// Add a metadata entry
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
