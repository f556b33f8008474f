//! Test support: throwaway HTTP servers
//!
//! [`control_service`] serves the REST API from a [`MemoryClient`], which
//! lets the same scenarios run through [`RemoteClient`](crate::RemoteClient)
//! and directly against the in-memory client.

use crate::{ClusterClient, MemoryClient};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dockyard_common::{Container, DatasetId, DatasetRequest, Error, Lease, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

/// Serve `app` on an ephemeral local port, returning `http://addr`
pub async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// The control service REST API backed by `backend`, mounted under `/v1`
pub fn control_service(backend: Arc<MemoryClient>) -> Router {
    let api = Router::new()
        .route("/version", get(version))
        .route("/state/nodes", get(list_nodes))
        .route("/configuration/containers", post(create_container))
        .route("/state/containers", get(list_containers_state))
        .route(
            "/configuration/datasets",
            post(create_dataset).get(list_datasets_configuration),
        )
        .route(
            "/configuration/datasets/{dataset_id}",
            post(move_dataset).delete(delete_dataset),
        )
        .route("/state/datasets", get(list_datasets_state))
        .route("/configuration/leases", post(acquire_lease).get(list_leases))
        .route(
            "/configuration/leases/{dataset_id}",
            axum::routing::delete(release_lease),
        )
        .with_state(backend);
    Router::new().nest("/v1", api)
}

type Backend = State<Arc<MemoryClient>>;

fn reply<T: Serialize>(status: StatusCode, result: dockyard_common::Result<T>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(err) => {
            let status = if err.is_conflict() {
                StatusCode::CONFLICT
            } else if err.is_not_found() {
                StatusCode::NOT_FOUND
            } else if matches!(err, Error::InvalidArgument(_)) {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(json!({"description": err.to_string()}))).into_response()
        }
    }
}

async fn version(State(backend): Backend) -> Response {
    reply(StatusCode::OK, backend.version().await)
}

async fn list_nodes(State(backend): Backend) -> Response {
    reply(StatusCode::OK, backend.list_nodes().await)
}

async fn create_container(State(backend): Backend, Json(container): Json<Container>) -> Response {
    let result = backend
        .create_container(container.node_uuid, &container.name, &container.image)
        .await;
    reply(StatusCode::CREATED, result)
}

async fn list_containers_state(State(backend): Backend) -> Response {
    reply(StatusCode::OK, backend.list_containers_state().await)
}

async fn create_dataset(State(backend): Backend, Json(request): Json<DatasetRequest>) -> Response {
    reply(StatusCode::CREATED, backend.create_dataset(request).await)
}

#[derive(Deserialize)]
struct MoveBody {
    primary: NodeId,
}

async fn move_dataset(
    State(backend): Backend,
    Path(dataset_id): Path<Uuid>,
    Json(body): Json<MoveBody>,
) -> Response {
    let result = backend
        .move_dataset(body.primary, DatasetId::from_uuid(dataset_id))
        .await;
    reply(StatusCode::OK, result)
}

async fn delete_dataset(State(backend): Backend, Path(dataset_id): Path<Uuid>) -> Response {
    let result = backend.delete_dataset(DatasetId::from_uuid(dataset_id)).await;
    reply(StatusCode::OK, result)
}

/// Configured datasets in the server's wire shape, which carries a
/// `deleted` flag on every entry
async fn list_datasets_configuration(State(backend): Backend) -> Response {
    let result = backend.list_datasets_configuration().await.map(|datasets| {
        datasets
            .into_iter()
            .map(|dataset| {
                let mut value = serde_json::to_value(dataset).unwrap();
                value["deleted"] = Value::Bool(false);
                value
            })
            .collect::<Vec<_>>()
    });
    reply(StatusCode::OK, result)
}

async fn list_datasets_state(State(backend): Backend) -> Response {
    reply(StatusCode::OK, backend.list_datasets_state().await)
}

async fn acquire_lease(State(backend): Backend, Json(lease): Json<Lease>) -> Response {
    let result = backend
        .acquire_lease(lease.dataset_id, lease.node_uuid, lease.expires)
        .await;
    reply(StatusCode::CREATED, result)
}

async fn release_lease(State(backend): Backend, Path(dataset_id): Path<Uuid>) -> Response {
    let result = backend.release_lease(DatasetId::from_uuid(dataset_id)).await;
    reply(StatusCode::OK, result)
}

async fn list_leases(State(backend): Backend) -> Response {
    reply(StatusCode::OK, backend.list_leases().await)
}
