//! LogRelay Transport
//!
//! Endpoint transports for the LogRelay registry.
//! Supports an in-memory journal and JSON Lines files.

pub mod jsonl;
pub mod memory;

pub use jsonl::{JsonLinesEndpoint, JsonLinesTransport};
pub use memory::{MemoryEndpoint, MemoryTransport};
