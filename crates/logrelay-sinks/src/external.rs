use logrelay_core::{ExternalBackend, LogEvent, Sink};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// External backend shared between the sink and whoever manages its lifecycle
pub type SharedBackend = Rc<RefCell<dyn ExternalBackend>>;

/// Wrap a backend for sharing
pub fn shared_backend<B: ExternalBackend + 'static>(backend: B) -> SharedBackend {
    Rc::new(RefCell::new(backend))
}

/// Forwards severity, logger name and message to the external backend
pub struct ExternalSink {
    backend: SharedBackend,
}

impl ExternalSink {
    pub fn new(backend: &SharedBackend) -> Self {
        Self {
            backend: Rc::clone(backend),
        }
    }
}

impl Sink for ExternalSink {
    fn name(&self) -> &'static str {
        "external"
    }

    fn handle(&self, event: &LogEvent<'_>) {
        match self.backend.try_borrow() {
            Ok(backend) => backend.log(event.severity, event.logger_name, event.message),
            Err(_) => debug!(logger = event.logger_name, "External backend busy, dropping log event"),
        }
    }
}
