//! Error types for dockyard
//!
//! Both client implementations report failures through the same [`Error`]
//! enum, so code written against one behaves identically against the other.

use thiserror::Error;

/// Common result type for dockyard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for dockyard
#[derive(Debug, Error)]
pub enum Error {
    // Conflicts
    #[error("dataset already exists: {0}")]
    DatasetAlreadyExists(String),

    #[error("container already exists: {0}")]
    ContainerAlreadyExists(String),

    #[error("lease already held by another node: {0}")]
    LeaseAlreadyHeld(String),

    // Missing identities
    #[error("dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("lease not found: {0}")]
    LeaseNotFound(String),

    // Protocol errors
    #[error("unexpected response code {code}:\n{body}")]
    UnexpectedResponse { code: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),

    // Caller errors
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// A failure the control service signals with a dedicated status code
///
/// Endpoints declare which status codes map to which rejection as a static
/// table; the transport turns a matching response into the error via
/// [`Rejection::into_error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    DatasetAlreadyExists,
    ContainerAlreadyExists,
    LeaseAlreadyHeld,
    DatasetNotFound,
    LeaseNotFound,
}

impl Rejection {
    /// Build the error for this rejection, carrying the response body
    pub fn into_error(self, body: impl Into<String>) -> Error {
        let body = body.into();
        match self {
            Self::DatasetAlreadyExists => Error::DatasetAlreadyExists(body),
            Self::ContainerAlreadyExists => Error::ContainerAlreadyExists(body),
            Self::LeaseAlreadyHeld => Error::LeaseAlreadyHeld(body),
            Self::DatasetNotFound => Error::DatasetNotFound(body),
            Self::LeaseNotFound => Error::LeaseNotFound(body),
        }
    }
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// The rejection kind, if the service (or its in-memory stand-in)
    /// refused the operation
    #[must_use]
    pub const fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::DatasetAlreadyExists(_) => Some(Rejection::DatasetAlreadyExists),
            Self::ContainerAlreadyExists(_) => Some(Rejection::ContainerAlreadyExists),
            Self::LeaseAlreadyHeld(_) => Some(Rejection::LeaseAlreadyHeld),
            Self::DatasetNotFound(_) => Some(Rejection::DatasetNotFound),
            Self::LeaseNotFound(_) => Some(Rejection::LeaseNotFound),
            _ => None,
        }
    }

    /// Check if this error reports an identity collision
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DatasetAlreadyExists(_)
                | Self::ContainerAlreadyExists(_)
                | Self::LeaseAlreadyHeld(_)
        )
    }

    /// Check if this is a not found error
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::DatasetNotFound(_) | Self::LeaseNotFound(_))
    }

    /// Check if retrying the same call later can succeed
    ///
    /// A held lease may expire or be released; an existing dataset or
    /// container name never goes away on its own.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::LeaseAlreadyHeld(_) | Self::Transport(_))
    }
}
