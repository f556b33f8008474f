//! Behaviour every `ClusterClient` must share
//!
//! Each test runs the same scenario against a `MemoryClient` and against a
//! `RemoteClient` talking to an HTTP control service backed by another
//! `MemoryClient`.

use crate::testing::{control_service, spawn_server};
use crate::{ClusterClient, MemoryClient, RemoteClient};
use dockyard_common::{DatasetId, DatasetRequest, DockerImage, NodeId, Rejection};
use std::collections::HashSet;
use std::num::NonZeroU64;
use std::sync::Arc;

type Clients = Vec<(&'static str, Box<dyn ClusterClient>)>;

async fn clients() -> Clients {
    let memory = MemoryClient::new();
    let backend = Arc::new(MemoryClient::with_nodes(memory.nodes().to_vec()));
    let base = spawn_server(control_service(backend)).await;
    let remote = RemoteClient::with_http_client(format!("{base}/v1"), reqwest::Client::new());
    vec![
        ("memory", Box::new(memory) as Box<dyn ClusterClient>),
        ("remote", Box::new(remote) as Box<dyn ClusterClient>),
    ]
}

async fn two_nodes(client: &dyn ClusterClient) -> (NodeId, NodeId) {
    let nodes = client.list_nodes().await.unwrap();
    (nodes[0].uuid, nodes[1].uuid)
}

#[tokio::test]
async fn test_version_and_nodes() {
    for (name, client) in clients().await {
        let version = client.version().await.unwrap();
        assert!(version.contains_key("dockyard"), "{name}");

        let nodes = client.list_nodes().await.unwrap();
        assert_eq!(nodes.len(), 2, "{name}");
    }
}

#[tokio::test]
async fn test_dataset_lifecycle() {
    for (name, client) in clients().await {
        let (node1, node2) = two_nodes(&*client).await;
        let size = NonZeroU64::new(1_073_741_824).unwrap();

        let created = client
            .create_dataset(DatasetRequest::new(node1).with_maximum_size(size))
            .await
            .unwrap();
        assert_eq!(created.primary, node1, "{name}");
        assert_eq!(created.maximum_size, Some(size), "{name}");

        let moved = client
            .move_dataset(node2, created.dataset_id)
            .await
            .unwrap();
        assert_eq!(moved.dataset_id, created.dataset_id, "{name}");
        assert_eq!(moved.primary, node2, "{name}");
        assert_eq!(moved.maximum_size, Some(size), "{name}");

        let deleted = client.delete_dataset(created.dataset_id).await.unwrap();
        assert_eq!(deleted, moved, "{name}");

        let configured = client.list_datasets_configuration().await.unwrap();
        assert!(
            configured.iter().all(|d| d.dataset_id != created.dataset_id),
            "{name}"
        );
    }
}

#[tokio::test]
async fn test_dataset_ids_are_unique() {
    for (name, client) in clients().await {
        let (node, _) = two_nodes(&*client).await;

        let mut ids = HashSet::new();
        for _ in 0..5 {
            let dataset = client
                .create_dataset(DatasetRequest::new(node))
                .await
                .unwrap();
            assert!(ids.insert(dataset.dataset_id), "{name}");
        }

        let chosen = DatasetId::new();
        let dataset = client
            .create_dataset(
                DatasetRequest::new(node)
                    .with_dataset_id(chosen)
                    .with_metadata("owner", "ops"),
            )
            .await
            .unwrap();
        assert_eq!(dataset.dataset_id, chosen, "{name}");
        assert_eq!(dataset.metadata.get("owner").map(String::as_str), Some("ops"));

        let err = client
            .create_dataset(DatasetRequest::new(node).with_dataset_id(chosen))
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::DatasetAlreadyExists), "{name}");
        assert_eq!(client.list_datasets_configuration().await.unwrap().len(), 6);
    }
}

#[tokio::test]
async fn test_state_follows_configuration() {
    for (name, client) in clients().await {
        let (node, _) = two_nodes(&*client).await;
        let dataset = client
            .create_dataset(DatasetRequest::new(node))
            .await
            .unwrap();

        let state = client.list_datasets_state().await.unwrap();
        let entry = state
            .iter()
            .find(|s| s.dataset_id == dataset.dataset_id)
            .unwrap_or_else(|| panic!("{name}: no state for new dataset"));
        assert!(
            entry.path.as_ref().is_some_and(|p| !p.as_os_str().is_empty()),
            "{name}"
        );

        client.delete_dataset(dataset.dataset_id).await.unwrap();
        let state = client.list_datasets_state().await.unwrap();
        assert!(
            state.iter().all(|s| s.dataset_id != dataset.dataset_id),
            "{name}"
        );
    }
}

#[tokio::test]
async fn test_unknown_dataset() {
    for (name, client) in clients().await {
        let (node, _) = two_nodes(&*client).await;
        let missing = DatasetId::new();

        let err = client.move_dataset(node, missing).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::DatasetNotFound), "{name}");

        let err = client.delete_dataset(missing).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::DatasetNotFound), "{name}");
    }
}

#[tokio::test]
async fn test_containers() {
    for (name, client) in clients().await {
        let (node, other) = two_nodes(&*client).await;
        let image: DockerImage = "nginx:1.25".parse().unwrap();

        let container = client.create_container(node, "web", &image).await.unwrap();
        assert_eq!(container.node_uuid, node, "{name}");
        assert_eq!(container.image, image, "{name}");

        let err = client
            .create_container(other, "web", &image)
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::ContainerAlreadyExists), "{name}");

        let state = client.list_containers_state().await.unwrap();
        assert_eq!(state.len(), 1, "{name}");
        assert_eq!(state[0].name, "web", "{name}");
        assert_eq!(state[0].node_uuid, node, "{name}");
    }
}

#[tokio::test]
async fn test_lease_exclusivity() {
    for (name, client) in clients().await {
        let (node_a, node_b) = two_nodes(&*client).await;
        let dataset = DatasetId::new();

        client
            .acquire_lease(dataset, node_a, Some(60.0))
            .await
            .unwrap();

        let err = client
            .acquire_lease(dataset, node_b, Some(60.0))
            .await
            .unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::LeaseAlreadyHeld), "{name}");

        let released = client.release_lease(dataset).await.unwrap();
        assert_eq!(released.node_uuid, node_a, "{name}");

        let lease = client
            .acquire_lease(dataset, node_b, Some(60.0))
            .await
            .unwrap();
        assert_eq!(lease.node_uuid, node_b, "{name}");
    }
}

#[tokio::test]
async fn test_lease_renewal() {
    for (name, client) in clients().await {
        let (node, _) = two_nodes(&*client).await;
        let dataset = DatasetId::new();

        client.acquire_lease(dataset, node, Some(10.0)).await.unwrap();
        let renewed = client.acquire_lease(dataset, node, Some(300.0)).await.unwrap();
        assert_eq!(renewed.expires, Some(300.0), "{name}");

        let leases = client.list_leases().await.unwrap();
        assert_eq!(leases.len(), 1, "{name}");
        assert_eq!(leases[0].expires, Some(300.0), "{name}");
    }
}

#[tokio::test]
async fn test_lease_expiry_round_trip() {
    for (name, client) in clients().await {
        let (node, _) = two_nodes(&*client).await;

        for expires in [Some(0.0), Some(1.0), Some(60.0), Some(3600.5), None] {
            let dataset = DatasetId::new();
            client.acquire_lease(dataset, node, expires).await.unwrap();

            let leases = client.list_leases().await.unwrap();
            let lease = leases.iter().find(|l| l.dataset_id == dataset).unwrap();
            match (expires, lease.expires) {
                (Some(sent), Some(got)) => {
                    assert!((sent - got).abs() < 0.01, "{name}: {sent} vs {got}");
                }
                (None, None) => {}
                other => panic!("{name}: expiry mismatch {other:?}"),
            }
        }
    }
}

#[tokio::test]
async fn test_release() {
    for (name, client) in clients().await {
        let (node, _) = two_nodes(&*client).await;
        let dataset = DatasetId::new();

        let err = client.release_lease(dataset).await.unwrap_err();
        assert_eq!(err.rejection(), Some(Rejection::LeaseNotFound), "{name}");

        let acquired = client.acquire_lease(dataset, node, None).await.unwrap();
        let released = client.release_lease(dataset).await.unwrap();
        assert_eq!(released, acquired, "{name}");

        let leases = client.list_leases().await.unwrap();
        assert!(leases.iter().all(|l| l.dataset_id != dataset), "{name}");
    }
}

/// Moving a dataset does not consult leases: the primary changes even while
/// another node holds the lease.
#[tokio::test]
async fn test_move_ignores_leases() {
    for (name, client) in clients().await {
        let (holder, other) = two_nodes(&*client).await;
        let dataset = client
            .create_dataset(DatasetRequest::new(holder))
            .await
            .unwrap();
        client
            .acquire_lease(dataset.dataset_id, holder, None)
            .await
            .unwrap();

        let moved = client.move_dataset(other, dataset.dataset_id).await.unwrap();
        assert_eq!(moved.primary, other, "{name}");

        let leases = client.list_leases().await.unwrap();
        assert_eq!(leases[0].node_uuid, holder, "{name}");
    }
}
