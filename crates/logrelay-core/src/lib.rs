//! LogRelay Core
//!
//! Core types, traits, and configuration shared by the LogRelay crates.

pub mod config;
pub mod error;
pub mod event;
pub mod owner;
pub mod traits;

// Re-export commonly used types
pub use config::{Config, ConsoleConfig, LoggingOptions, RegistryConfig};
pub use error::{BackendError, RelayError, Result, Status, TransportError};
pub use event::{LogEvent, LogLocation, LogRecord, Severity, Stamp};
pub use owner::{NodeOwner, OwnerId};
pub use traits::{Endpoint, ExternalBackend, Owner, Sink, Transport};
