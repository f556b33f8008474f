//! Client for the control service REST API

use crate::client::ClusterClient;
use crate::lease::validate_expiry;
use crate::transport::{ErrorCodes, Transport};
use async_trait::async_trait;
use dockyard_common::{
    ClientConfig, Container, ContainerState, Dataset, DatasetId, DatasetRequest, DatasetState,
    DockerImage, Error, Lease, Node, NodeId, Rejection, Result, VersionInfo,
};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const OK: &[StatusCode] = &[StatusCode::OK];
const CREATED: &[StatusCode] = &[StatusCode::CREATED];
const OK_OR_CREATED: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED];

// Per-endpoint rejection tables
const NO_REJECTIONS: ErrorCodes = &[];
const CREATE_CONTAINER: ErrorCodes = &[(StatusCode::CONFLICT, Rejection::ContainerAlreadyExists)];
const CREATE_DATASET: ErrorCodes = &[(StatusCode::CONFLICT, Rejection::DatasetAlreadyExists)];
const UPDATE_DATASET: ErrorCodes = &[(StatusCode::NOT_FOUND, Rejection::DatasetNotFound)];
const ACQUIRE_LEASE: ErrorCodes = &[(StatusCode::CONFLICT, Rejection::LeaseAlreadyHeld)];
const RELEASE_LEASE: ErrorCodes = &[(StatusCode::NOT_FOUND, Rejection::LeaseNotFound)];

#[derive(Serialize)]
struct CreateContainerBody<'a> {
    node_uuid: NodeId,
    name: &'a str,
    image: &'a DockerImage,
}

#[derive(Serialize)]
struct MoveDatasetBody {
    primary: NodeId,
}

#[derive(Serialize)]
struct AcquireLeaseBody {
    dataset_id: DatasetId,
    node_uuid: NodeId,
    expires: Option<f64>,
}

/// A configured dataset as listed by the service, which keeps deleted
/// datasets around with a marker
#[derive(Deserialize)]
struct DatasetRecord {
    #[serde(flatten)]
    dataset: Dataset,
    #[serde(default)]
    deleted: bool,
}

fn json_body<T: Serialize>(body: &T) -> Result<Option<Value>> {
    serde_json::to_value(body)
        .map(Some)
        .map_err(|e| Error::invalid_argument(format!("unencodable request body: {e}")))
}

/// Talks to a control service over HTTP(S)
#[derive(Clone, Debug)]
pub struct RemoteClient {
    transport: Transport,
}

impl RemoteClient {
    /// Create a client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
        })
    }

    /// Create a client using an already configured HTTP client
    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            transport: Transport::with_http_client(base_url, http),
        }
    }

    /// Base URL of the API
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }
}

#[async_trait]
impl ClusterClient for RemoteClient {
    async fn version(&self) -> Result<VersionInfo> {
        self.transport
            .request(Method::GET, "/version", None, OK, NO_REJECTIONS)
            .await
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.transport
            .request(Method::GET, "/state/nodes", None, OK, NO_REJECTIONS)
            .await
    }

    async fn create_container(
        &self,
        node_uuid: NodeId,
        name: &str,
        image: &DockerImage,
    ) -> Result<Container> {
        let body = json_body(&CreateContainerBody {
            node_uuid,
            name,
            image,
        })?;
        self.transport
            .request(
                Method::POST,
                "/configuration/containers",
                body,
                CREATED,
                CREATE_CONTAINER,
            )
            .await
    }

    async fn list_containers_state(&self) -> Result<Vec<ContainerState>> {
        self.transport
            .request(Method::GET, "/state/containers", None, OK, NO_REJECTIONS)
            .await
    }

    async fn create_dataset(&self, request: DatasetRequest) -> Result<Dataset> {
        let body = json_body(&request)?;
        self.transport
            .request(
                Method::POST,
                "/configuration/datasets",
                body,
                CREATED,
                CREATE_DATASET,
            )
            .await
    }

    async fn move_dataset(&self, primary: NodeId, dataset_id: DatasetId) -> Result<Dataset> {
        let body = json_body(&MoveDatasetBody { primary })?;
        self.transport
            .request(
                Method::POST,
                &format!("/configuration/datasets/{dataset_id}"),
                body,
                OK,
                UPDATE_DATASET,
            )
            .await
    }

    async fn delete_dataset(&self, dataset_id: DatasetId) -> Result<Dataset> {
        self.transport
            .request(
                Method::DELETE,
                &format!("/configuration/datasets/{dataset_id}"),
                None,
                OK,
                UPDATE_DATASET,
            )
            .await
    }

    async fn list_datasets_configuration(&self) -> Result<Vec<Dataset>> {
        let records: Vec<DatasetRecord> = self
            .transport
            .request(Method::GET, "/configuration/datasets", None, OK, NO_REJECTIONS)
            .await?;
        Ok(records
            .into_iter()
            .filter(|record| !record.deleted)
            .map(|record| record.dataset)
            .collect())
    }

    async fn list_datasets_state(&self) -> Result<Vec<DatasetState>> {
        self.transport
            .request(Method::GET, "/state/datasets", None, OK, NO_REJECTIONS)
            .await
    }

    async fn acquire_lease(
        &self,
        dataset_id: DatasetId,
        node_uuid: NodeId,
        expires: Option<f64>,
    ) -> Result<Lease> {
        validate_expiry(expires)?;
        let body = json_body(&AcquireLeaseBody {
            dataset_id,
            node_uuid,
            expires,
        })?;
        self.transport
            .request(
                Method::POST,
                "/configuration/leases",
                body,
                OK_OR_CREATED,
                ACQUIRE_LEASE,
            )
            .await
    }

    async fn release_lease(&self, dataset_id: DatasetId) -> Result<Lease> {
        self.transport
            .request(
                Method::DELETE,
                &format!("/configuration/leases/{dataset_id}"),
                None,
                OK,
                RELEASE_LEASE,
            )
            .await
    }

    async fn list_leases(&self) -> Result<Vec<Lease>> {
        self.transport
            .request(Method::GET, "/configuration/leases", None, OK, NO_REJECTIONS)
            .await
    }
}
