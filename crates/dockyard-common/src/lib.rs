//! Dockyard Common - Shared types for the cluster control-plane client
//!
//! This crate provides the domain model (nodes, containers, datasets,
//! leases), the error taxonomy shared by every client implementation and
//! the client configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ClientConfig, TlsConfig};
pub use error::{Error, Rejection, Result};
pub use types::*;
