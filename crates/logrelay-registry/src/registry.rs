//! # Logger registry
//!
//! Maps a logger name to the single publishing endpoint created for its owner.
//!
//! ## Lifecycle
//! ```text
//! Uninitialized ──init()──► Initialized ──fini() (all endpoints torn down)──► Uninitialized
//!                               │
//!                               ├─► register(owner)   create endpoint, insert entry
//!                               └─► unregister(owner) destroy endpoint, remove entry
//! ```
//!
//! ## Rules
//! - A logger name maps to at most one entry; each endpoint belongs to exactly one entry.
//! - A failed `register` never leaves an endpoint behind: if the entry cannot be
//!   inserted the freshly created endpoint is destroyed before returning.
//! - An entry is removed only after its endpoint was destroyed successfully,
//!   and only by the owner it was created for.
//! - `register`/`unregister`/`fini` on an uninitialized registry succeed and do
//!   nothing, so call sites never have to know whether routing is enabled.
//! - Not thread-safe: callers serialize access.

use logrelay_core::config::RegistryConfig;
use logrelay_core::{Endpoint, Owner, OwnerId, RelayError, Result, Transport};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Registry shared between lifecycle callers and the registry sink
pub type SharedRegistry = Rc<RefCell<Registry>>;

/// A live endpoint and the owner it was created for
pub struct RegistryEntry {
    name: String,
    owner: OwnerId,
    endpoint: Box<dyn Endpoint>,
}

impl RegistryEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn endpoint(&self) -> &dyn Endpoint {
        self.endpoint.as_ref()
    }
}

/// Logger-name to endpoint registry
pub struct Registry {
    config: RegistryConfig,
    transport: Box<dyn Transport>,
    /// `Some` exactly while initialized
    loggers: Option<HashMap<String, RegistryEntry>>,
}

impl Registry {
    /// Create an uninitialized registry creating endpoints through `transport`
    pub fn new<T: Transport + 'static>(config: RegistryConfig, transport: T) -> Self {
        Self {
            config,
            transport: Box::new(transport),
            loggers: None,
        }
    }

    /// Wrap the registry for sharing with a `RegistrySink`
    pub fn into_shared(self) -> SharedRegistry {
        Rc::new(RefCell::new(self))
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.loggers.is_some()
    }

    /// Number of registered loggers (zero while uninitialized)
    pub fn len(&self) -> usize {
        self.loggers.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Look up the entry registered under `name`
    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.loggers.as_ref()?.get(name)
    }

    /// Names of all registered loggers, in map order
    pub fn logger_names(&self) -> Vec<&str> {
        self.loggers
            .iter()
            .flat_map(|loggers| loggers.keys().map(String::as_str))
            .collect()
    }

    /// Allocate the logger map.
    ///
    /// Calling `init` on an initialized registry is a no-op: entries are kept.
    pub fn init(&mut self) -> Result<()> {
        if self.loggers.is_some() {
            debug!("Registry already initialized");
            return Ok(());
        }

        let mut loggers = HashMap::new();
        loggers
            .try_reserve(self.config.initial_capacity)
            .map_err(|e| RelayError::BadAlloc(format!("Failed to allocate logger map: {}", e)))?;
        self.loggers = Some(loggers);

        info!(topic = %self.config.topic, "Registry initialized");
        Ok(())
    }

    /// Create an endpoint for `owner` and register it under the owner's logger name
    pub fn register(&mut self, owner: &dyn Owner) -> Result<()> {
        let Some(loggers) = self.loggers.as_mut() else {
            debug!(owner = %owner.id(), "Registry not initialized, skipping register");
            return Ok(());
        };

        let owner_id = owner.id();
        let name = owner
            .logger_name()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                RelayError::InvalidArgument(format!("{} has no logger name", owner_id))
            })?;

        if loggers.contains_key(&name) {
            return Err(RelayError::AlreadyInit(name));
        }

        let mut endpoint = self
            .transport
            .create_endpoint(owner_id, &self.config.topic)?;

        if let Err(e) = reserve_slot(loggers, self.config.max_loggers) {
            warn!(logger = %name, error = %e, "Failed to add endpoint to registry, destroying it");
            // The insertion failure is what the caller needs to see
            if let Err(destroy_err) = self
                .transport
                .destroy_endpoint(owner_id, endpoint.as_mut())
            {
                warn!(logger = %name, error = %destroy_err, "Failed to destroy rolled back endpoint");
            }
            return Err(e);
        }

        info!(logger = %name, owner = %owner_id, "Registered logger endpoint");
        loggers.insert(
            name.clone(),
            RegistryEntry {
                name,
                owner: owner_id,
                endpoint,
            },
        );
        Ok(())
    }

    /// Destroy the endpoint registered for `owner` and forget the entry.
    ///
    /// An entry registered under the same name by a different owner is left
    /// alone and reported as `NotInit`. If the transport fails to destroy the
    /// endpoint the entry is kept.
    pub fn unregister(&mut self, owner: &dyn Owner) -> Result<()> {
        let Some(loggers) = self.loggers.as_mut() else {
            debug!(owner = %owner.id(), "Registry not initialized, skipping unregister");
            return Ok(());
        };

        let name = owner
            .logger_name()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| RelayError::UnresolvedOwner(owner.id()))?;

        let Some(entry) = loggers.get_mut(&name) else {
            return Err(RelayError::NotInit(name));
        };
        if entry.owner != owner.id() {
            debug!(
                logger = %name,
                owner = %owner.id(),
                registered = %entry.owner,
                "Logger registered by another owner, skipping unregister"
            );
            return Err(RelayError::NotInit(name));
        }

        self.transport
            .destroy_endpoint(entry.owner, entry.endpoint.as_mut())?;
        loggers.remove(&name);

        info!(logger = %name, "Unregistered logger endpoint");
        Ok(())
    }

    /// Destroy every endpoint, then drop the map.
    ///
    /// Stops at the first endpoint that fails to tear down and returns its
    /// error. Entries already torn down are gone; the failed one and all
    /// remaining ones stay registered and the registry stays initialized.
    pub fn fini(&mut self) -> Result<()> {
        let Some(loggers) = self.loggers.as_mut() else {
            return Ok(());
        };

        let names: Vec<String> = loggers.keys().cloned().collect();
        for name in names {
            if let Some(entry) = loggers.get_mut(&name) {
                if let Err(e) = self
                    .transport
                    .destroy_endpoint(entry.owner, entry.endpoint.as_mut())
                {
                    warn!(logger = %name, error = %e, "Failed to tear down logger endpoint");
                    return Err(e.into());
                }
            }
            loggers.remove(&name);
            debug!(logger = %name, "Tore down logger endpoint");
        }

        self.loggers = None;
        info!("Registry finalized");
        Ok(())
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        if self.is_initialized() {
            if let Err(e) = self.fini() {
                warn!(
                    error = %e,
                    remaining = self.len(),
                    "Registry dropped with endpoints that failed to tear down"
                );
            }
        }
    }
}

/// Make room for one more entry, or fail the way an allocation failure would
fn reserve_slot(loggers: &mut HashMap<String, RegistryEntry>, limit: Option<usize>) -> Result<()> {
    if let Some(max) = limit {
        if loggers.len() >= max {
            return Err(RelayError::BadAlloc(format!(
                "logger limit of {} reached",
                max
            )));
        }
    }

    loggers
        .try_reserve(1)
        .map_err(|e| RelayError::BadAlloc(format!("Failed to grow logger map: {}", e)))
}
