use crate::registry::SharedRegistry;
use logrelay_core::{Owner, OwnerId, RelayError, Result};
use std::rc::Rc;
use tracing::{debug, warn};

/// Keeps an owner's endpoint registered for as long as the guard lives.
///
/// Dropping the guard unregisters the owner, so an owner that goes away on
/// any path cannot leave its endpoint behind. Use [`Registration::release`]
/// to unregister explicitly and observe the result.
pub struct Registration {
    registry: SharedRegistry,
    owner: OwnerId,
    name: String,
    released: bool,
}

impl Registration {
    /// Register `owner` in `registry`
    pub fn new(registry: &SharedRegistry, owner: &dyn Owner) -> Result<Self> {
        registry
            .try_borrow_mut()
            .map_err(|_| RelayError::RegistryBusy)?
            .register(owner)?;

        Ok(Self {
            registry: Rc::clone(registry),
            owner: owner.id(),
            name: owner.logger_name().unwrap_or_default(),
            released: false,
        })
    }

    pub fn logger_name(&self) -> &str {
        &self.name
    }

    /// Unregister now and report the outcome
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.unregister()
    }

    fn unregister(&self) -> Result<()> {
        self.registry
            .try_borrow_mut()
            .map_err(|_| RelayError::RegistryBusy)?
            .unregister(self)
    }
}

impl Owner for Registration {
    fn id(&self) -> OwnerId {
        self.owner
    }

    fn logger_name(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match self.unregister() {
            Ok(()) => {}
            // Torn down by a registry fini, or the name now belongs to another owner
            Err(RelayError::NotInit(name)) => {
                debug!(logger = %name, "Registration dropped after its endpoint was torn down");
            }
            Err(e) => {
                warn!(logger = %self.name, error = %e, "Failed to unregister on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use logrelay_core::config::RegistryConfig;
    use logrelay_core::{NodeOwner, Status};
    use logrelay_transport::MemoryTransport;

    fn shared(transport: &MemoryTransport) -> SharedRegistry {
        let mut registry = Registry::new(RegistryConfig::default(), transport.clone());
        registry.init().unwrap();
        registry.into_shared()
    }

    #[test]
    fn test_drop_unregisters() {
        let transport = MemoryTransport::new();
        let registry = shared(&transport);
        let nav = NodeOwner::new(OwnerId::new(1), "/robot", "nav");

        {
            let guard = Registration::new(&registry, &nav).unwrap();
            assert_eq!(guard.logger_name(), "robot.nav");
            assert!(registry.borrow().contains("robot.nav"));
        }

        assert!(registry.borrow().is_empty());
        assert_eq!(transport.destroyed(), vec![OwnerId::new(1)]);
    }

    #[test]
    fn test_release_reports_status() {
        let transport = MemoryTransport::new();
        transport.fail_destroy_on(1);
        let registry = shared(&transport);
        let nav = NodeOwner::new(OwnerId::new(1), "/robot", "nav");

        let guard = Registration::new(&registry, &nav).unwrap();
        let result = guard.release();

        assert_eq!(Status::from_result(&result), Status::Error);
        assert!(registry.borrow().contains("robot.nav"));
        // Released guards do not retry on drop
        assert_eq!(transport.destroy_calls(), 1);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let transport = MemoryTransport::new();
        let registry = shared(&transport);
        let nav = NodeOwner::new(OwnerId::new(1), "/robot", "nav");

        let _guard = Registration::new(&registry, &nav).unwrap();
        let err = Registration::new(&registry, &nav).err().unwrap();

        assert_eq!(err.status(), Status::AlreadyInit);
        assert_eq!(registry.borrow().len(), 1);
    }

    #[test]
    fn test_drop_after_fini_is_quiet() {
        let transport = MemoryTransport::new();
        let registry = shared(&transport);
        let nav = NodeOwner::new(OwnerId::new(1), "/robot", "nav");

        let guard = Registration::new(&registry, &nav).unwrap();
        registry.borrow_mut().fini().unwrap();
        registry.borrow_mut().init().unwrap();
        drop(guard);

        assert_eq!(transport.destroy_calls(), 1);
    }

    #[test]
    fn test_stale_guard_leaves_new_owner_registered() {
        let transport = MemoryTransport::new();
        let registry = shared(&transport);
        let first = NodeOwner::new(OwnerId::new(1), "/robot", "nav");
        let second = NodeOwner::new(OwnerId::new(2), "/robot", "nav");

        let guard = Registration::new(&registry, &first).unwrap();
        registry.borrow_mut().fini().unwrap();
        registry.borrow_mut().init().unwrap();
        registry.borrow_mut().register(&second).unwrap();
        drop(guard);

        let registry = registry.borrow();
        assert_eq!(registry.get("robot.nav").unwrap().owner(), OwnerId::new(2));
        assert_eq!(transport.destroyed(), vec![OwnerId::new(1)]);
        assert_eq!(transport.live_endpoints(), 1);
    }
}
