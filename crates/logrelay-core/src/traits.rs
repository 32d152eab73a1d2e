use crate::error::{BackendError, TransportError};
use crate::event::{LogEvent, LogRecord, Severity};
use crate::owner::OwnerId;
use std::path::Path;

/// Trait for sink handlers receiving every dispatched log event
///
/// Sinks never report failure to the caller: logging must not break the
/// code that merely wanted to log. Errors are swallowed (and traced) inside
/// `handle`.
///
/// LogRelay is single-threaded, so sinks are neither `Send` nor `Sync`.
pub trait Sink {
    /// Returns the name of the sink (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Consume one log event
    fn handle(&self, event: &LogEvent<'_>);
}

/// An external entity on whose behalf a publishing endpoint is created
pub trait Owner {
    fn id(&self) -> OwnerId;

    /// Logger name this owner logs under, `None` if it cannot be resolved
    fn logger_name(&self) -> Option<String>;
}

/// A handle able to publish structured log records on one topic
pub trait Endpoint {
    fn topic(&self) -> &str;

    fn publish(&self, record: &LogRecord) -> Result<(), TransportError>;
}

/// Creates and destroys publishing endpoints for owners
pub trait Transport {
    /// Create an endpoint for `owner` publishing on `topic`
    fn create_endpoint(
        &mut self,
        owner: OwnerId,
        topic: &str,
    ) -> Result<Box<dyn Endpoint>, TransportError>;

    /// Tear down an endpoint previously created for `owner`.
    ///
    /// On failure the endpoint must stay usable so the caller can keep it
    /// and retry later.
    fn destroy_endpoint(
        &mut self,
        owner: OwnerId,
        endpoint: &mut dyn Endpoint,
    ) -> Result<(), TransportError>;
}

/// A third-party logging library that log events are forwarded to
pub trait ExternalBackend {
    fn name(&self) -> &'static str;

    /// Bring the backend up, optionally from a backend-specific config file
    fn initialize(&mut self, config_path: Option<&Path>) -> Result<(), BackendError>;

    /// Set the level of one logger, or the default level when `logger` is `None`
    fn set_logger_level(
        &mut self,
        logger: Option<&str>,
        severity: Severity,
    ) -> Result<(), BackendError>;

    fn log(&self, severity: Severity, logger_name: &str, message: &str);

    fn shutdown(&mut self) -> Result<(), BackendError>;
}
