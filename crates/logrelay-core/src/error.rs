use crate::owner::OwnerId;
use std::fmt;
use thiserror::Error;

/// Core error type for LogRelay lifecycle operations
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Logger '{0}' already has a publishing endpoint")]
    AlreadyInit(String),

    #[error("Logger '{0}' has no publishing endpoint")]
    NotInit(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Allocation failed: {0}")]
    BadAlloc(String),

    #[error("Could not resolve a logger name for {0}")]
    UnresolvedOwner(OwnerId),

    #[error("Registry is already borrowed")]
    RegistryBusy,

    #[error("Dispatch chain is full ({max} sinks)")]
    ChainFull { max: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("External backend error: {0}")]
    Backend(#[from] BackendError),
}

impl RelayError {
    /// Collapse the error onto the flat status taxonomy
    pub fn status(&self) -> Status {
        match self {
            RelayError::AlreadyInit(_) => Status::AlreadyInit,
            RelayError::NotInit(_) => Status::NotInit,
            RelayError::InvalidArgument(_) | RelayError::ChainFull { .. } | RelayError::Config(_) => {
                Status::InvalidArgument
            }
            RelayError::BadAlloc(_) => Status::BadAlloc,
            RelayError::UnresolvedOwner(_)
            | RelayError::RegistryBusy
            | RelayError::Transport(_)
            | RelayError::Backend(_) => Status::Error,
        }
    }
}

/// Errors raised by an endpoint transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to create endpoint on topic '{topic}': {message}")]
    Create { topic: String, message: String },

    #[error("Failed to destroy endpoint: {0}")]
    Destroy(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the external logging backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to initialize external backend: {0}")]
    Initialize(String),

    #[error("Failed to set logger level: {0}")]
    Level(String),

    #[error("Failed to shut down external backend: {0}")]
    Shutdown(String),
}

/// Flat status codes returned by lifecycle operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    AlreadyInit,
    NotInit,
    InvalidArgument,
    BadAlloc,
    Error,
}

impl Status {
    /// Status of a lifecycle result
    pub fn from_result<T>(result: &std::result::Result<T, RelayError>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(e) => e.status(),
        }
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::AlreadyInit => write!(f, "ALREADY_INIT"),
            Status::NotInit => write!(f, "NOT_INIT"),
            Status::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            Status::BadAlloc => write!(f, "BAD_ALLOC"),
            Status::Error => write!(f, "ERROR"),
        }
    }
}

/// Result type alias for LogRelay operations
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RelayError::AlreadyInit("a".into()).status(), Status::AlreadyInit);
        assert_eq!(RelayError::NotInit("a".into()).status(), Status::NotInit);
        assert_eq!(RelayError::BadAlloc("full".into()).status(), Status::BadAlloc);
        assert_eq!(
            RelayError::UnresolvedOwner(OwnerId::new(3)).status(),
            Status::Error
        );
        assert_eq!(
            RelayError::from(TransportError::Destroy("gone".into())).status(),
            Status::Error
        );
        assert_eq!(RelayError::ChainFull { max: 4 }.status(), Status::InvalidArgument);
    }

    #[test]
    fn test_status_from_result() {
        let ok: Result<()> = Ok(());
        let err: Result<()> = Err(RelayError::NotInit("robot.nav".into()));
        assert_eq!(Status::from_result(&ok), Status::Ok);
        assert_eq!(Status::from_result(&err), Status::NotInit);
        assert_eq!(Status::NotInit.to_string(), "NOT_INIT");
    }
}
