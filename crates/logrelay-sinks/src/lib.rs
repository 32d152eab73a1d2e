//! LogRelay Sinks
//!
//! Sink handlers for the LogRelay dispatch chain.
//! Supports the console, per-logger endpoints, and an external backend.

pub mod console;
pub mod external;
pub mod registry;
pub mod tracing_backend;

pub use console::{ConsoleFormat, ConsoleSink};
pub use external::{shared_backend, ExternalSink, SharedBackend};
pub use registry::RegistrySink;
pub use tracing_backend::TracingBackend;
