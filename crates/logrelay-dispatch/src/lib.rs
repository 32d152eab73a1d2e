//! LogRelay Dispatch
//!
//! Fans every log event out to the configured sinks and brings the sink
//! subsystems up and down as one unit.

pub mod chain;
pub mod output;
pub mod report;
pub mod system;

pub use chain::{DispatchChain, MAX_SINKS};
pub use output::LogOutput;
pub use report::{ConfigureReport, Subsystem};
pub use system::{ConsoleFactory, LoggingSystem};
