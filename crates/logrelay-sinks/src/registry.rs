use logrelay_core::{LogEvent, LogRecord, Sink};
use logrelay_registry::SharedRegistry;
use std::rc::Rc;
use tracing::debug;

/// Publishes each event on the endpoint registered for its logger.
///
/// Events from loggers without an endpoint are dropped silently, and publish
/// failures are traced but never surfaced.
pub struct RegistrySink {
    registry: SharedRegistry,
}

impl RegistrySink {
    pub fn new(registry: &SharedRegistry) -> Self {
        Self {
            registry: Rc::clone(registry),
        }
    }
}

impl Sink for RegistrySink {
    fn name(&self) -> &'static str {
        "registry"
    }

    fn handle(&self, event: &LogEvent<'_>) {
        let Ok(registry) = self.registry.try_borrow() else {
            debug!(logger = event.logger_name, "Registry busy, dropping log event");
            return;
        };

        let Some(entry) = registry.get(event.logger_name) else {
            return;
        };

        let record = LogRecord::from(event);
        if let Err(e) = entry.endpoint().publish(&record) {
            debug!(logger = event.logger_name, error = %e, "Failed to publish log record");
        }
    }
}
