use logrelay_core::{LogEvent, RelayError, Result, Sink};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Maximum number of sinks in one chain
pub const MAX_SINKS: usize = 4;

/// Ordered, bounded list of sinks invoked for every log event
///
/// The order is fixed when the chain is built; a reconfiguration builds a
/// new chain instead of mutating this one.
pub struct DispatchChain {
    sinks: Vec<Box<dyn Sink>>,
}

impl DispatchChain {
    /// Create a new empty chain
    pub fn new() -> Self {
        Self {
            sinks: Vec::with_capacity(MAX_SINKS),
        }
    }

    /// Add a sink to the end of the chain
    pub fn add_sink<S: Sink + 'static>(mut self, sink: S) -> Result<Self> {
        self.push(Box::new(sink))?;
        Ok(self)
    }

    /// Append a boxed sink, rejecting it once the chain holds `MAX_SINKS`
    pub fn push(&mut self, sink: Box<dyn Sink>) -> Result<()> {
        if self.sinks.len() >= MAX_SINKS {
            warn!(sink = sink.name(), max = MAX_SINKS, "Dispatch chain is full");
            return Err(RelayError::ChainFull { max: MAX_SINKS });
        }

        info!(sink = sink.name(), "Adding sink to dispatch chain");
        self.sinks.push(sink);
        Ok(())
    }

    /// Hand the event to every sink, in order.
    ///
    /// A sink that panics is skipped; the remaining sinks still run.
    pub fn dispatch(&self, event: &LogEvent<'_>) {
        for sink in &self.sinks {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| sink.handle(event)));
            if outcome.is_err() {
                warn!(sink = sink.name(), logger = event.logger_name, "Sink panicked");
            }
        }
    }

    /// Get the number of sinks in the chain
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Get the names of all sinks in the chain
    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }
}

impl Default for DispatchChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for DispatchChain {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    fn handle(&self, event: &LogEvent<'_>) {
        if self.sinks.is_empty() {
            debug!(logger = event.logger_name, "No sinks configured, dropping log event");
            return;
        }
        self.dispatch(event);
    }
}
