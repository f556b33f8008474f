//! Configuration types for dockyard clients

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Default control service API port
pub const DEFAULT_PORT: u16 = 4523;

/// Connection settings for the control service REST API
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Control service host name or IP address
    pub host: String,
    /// Control service port
    pub port: u16,
    /// API version path prefix (e.g., "v1")
    pub api_version: String,
    /// Client certificates; plain HTTP is used when unset
    pub tls: Option<TlsConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            api_version: "v1".to_string(),
            tls: None,
        }
    }
}

/// Certificate material for talking to the control service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Cluster CA certificate (PEM)
    pub ca_cluster_path: PathBuf,
    /// User certificate (PEM)
    pub cert_path: PathBuf,
    /// User private key (PEM)
    pub key_path: PathBuf,
}

impl TlsConfig {
    /// Conventional file layout inside a certificate directory
    pub fn from_directory(dir: impl AsRef<Path>, user: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            ca_cluster_path: dir.join("cluster.crt"),
            cert_path: dir.join(format!("{user}.crt")),
            key_path: dir.join(format!("{user}.key")),
        }
    }
}

impl ClientConfig {
    /// Create a config for the given host with default port and version
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Set the port
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the API version prefix
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Use TLS with the given certificates
    #[must_use]
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Load a config from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse a config from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::configuration(format!("invalid client config: {e}")))
    }

    /// Base URL every request path is appended to
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.tls.is_some() { "https" } else { "http" };
        let host = match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(addr)) => format!("[{addr}]"),
            _ => self.host.clone(),
        };
        let version = self.api_version.trim_matches('/');
        if version.is_empty() {
            format!("{scheme}://{host}:{}", self.port)
        } else {
            format!("{scheme}://{host}:{}/{version}", self.port)
        }
    }
}
