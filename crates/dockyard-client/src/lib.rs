//! Dockyard Client - Control service clients
//!
//! This crate provides the [`ClusterClient`] capability and its two
//! implementations:
//! - [`RemoteClient`] sends each operation to the control service REST API
//! - [`MemoryClient`] keeps configuration, state and leases in process
//!
//! # Example
//!
//! ```rust,ignore
//! use dockyard_client::{ClusterClient, RemoteClient};
//! use dockyard_common::{ClientConfig, DatasetRequest};
//!
//! let client = RemoteClient::new(&ClientConfig::new("control.example.com"))?;
//! let nodes = client.list_nodes().await?;
//! let dataset = client.create_dataset(DatasetRequest::new(nodes[0].uuid)).await?;
//! ```

pub mod client;
pub mod lease;
pub mod ledger;
pub mod memory;
pub mod remote;
pub mod transport;

#[cfg(test)]
mod conformance;
#[cfg(test)]
mod testing;

// Re-exports
pub use client::ClusterClient;
pub use ledger::{LeaseEntry, LeaseLedger, LedgerError, MemoryLedger};
pub use memory::MemoryClient;
pub use remote::RemoteClient;
pub use transport::Transport;
