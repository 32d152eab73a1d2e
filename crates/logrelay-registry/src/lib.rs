//! LogRelay Registry
//!
//! Mapping from logger names to the publishing endpoints
//! created for their owners, with strict create/destroy pairing.

pub mod registration;
pub mod registry;

pub use registration::Registration;
pub use registry::{Registry, RegistryEntry, SharedRegistry};
