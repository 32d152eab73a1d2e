//! Configuration resolver
//!
//! [`LoggingSystem`] owns the registry, the external backend and the output
//! slot, and moves between two states:
//!
//! ```text
//!   Unconfigured --configure--> Configured --shutdown--> Unconfigured
//! ```
//!
//! `configure` builds a fresh [`DispatchChain`] from the enabled subsystems.
//! A subsystem that fails to come up is left out of the chain; the call still
//! installs whatever did come up and returns the last failure it saw.
//!
//! `shutdown` puts the console back as the sole handler before tearing
//! anything down, then finalizes the registry and the backend in that order,
//! stopping at the first failure.

use crate::chain::DispatchChain;
use crate::output::LogOutput;
use crate::report::{ConfigureReport, Subsystem};
use logrelay_core::{
    BackendError, Config, ExternalBackend, LogEvent, LoggingOptions, Owner, RelayError, Result,
    Severity, Sink, Status, Transport,
};
use logrelay_registry::{Registration, Registry, SharedRegistry};
use logrelay_sinks::{ConsoleFormat, ConsoleSink, ExternalSink, RegistrySink, SharedBackend};
use std::cell::RefMut;
use tracing::{debug, info, warn};

/// Builds the console handler, both for the chain and as the shutdown fallback
pub type ConsoleFactory = Box<dyn Fn() -> Box<dyn Sink>>;

pub struct LoggingSystem {
    registry: SharedRegistry,
    backend: SharedBackend,
    console: ConsoleFactory,
    output: LogOutput,
    options: Option<LoggingOptions>,
    report: ConfigureReport,
}

impl LoggingSystem {
    /// Create an unconfigured system logging to stdout
    pub fn new(registry: Registry, backend: SharedBackend) -> Self {
        let console: ConsoleFactory = Box::new(|| Box::new(ConsoleSink::new()));
        let output = LogOutput::new(console());

        Self {
            registry: registry.into_shared(),
            backend,
            console,
            output,
            options: None,
            report: ConfigureReport::default(),
        }
    }

    /// Replace the console handler factory and install its handler now
    pub fn with_console<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Sink> + 'static,
    {
        self.console = Box::new(factory);
        self.output.install((self.console)());
        self
    }

    /// Build an unconfigured system from configuration.
    ///
    /// Call [`LoggingSystem::configure`] with `config.logging` to bring it up.
    pub fn from_config<T: Transport + 'static>(
        config: &Config,
        transport: T,
        backend: SharedBackend,
    ) -> Self {
        let format = ConsoleFormat::parse(&config.console.format);
        info!(
            topic = %config.registry.topic,
            console_format = ?format,
            "Creating logging system from config"
        );

        let registry = Registry::new(config.registry.clone(), transport);
        Self::new(registry, backend).with_console(move || Box::new(ConsoleSink::with_format(format)))
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    pub fn output(&self) -> &LogOutput {
        &self.output
    }

    pub fn is_configured(&self) -> bool {
        self.options.is_some()
    }

    /// Options of the active configuration
    pub fn options(&self) -> Option<&LoggingOptions> {
        self.options.as_ref()
    }

    /// Per-subsystem outcomes of the most recent `configure`
    pub fn last_report(&self) -> &ConfigureReport {
        &self.report
    }

    /// Route one event through the active output handler
    pub fn log(&self, event: &LogEvent<'_>) {
        self.output.log(event);
    }

    pub fn register(&self, owner: &dyn Owner) -> Result<()> {
        self.borrow_registry()?.register(owner)
    }

    pub fn unregister(&self, owner: &dyn Owner) -> Result<()> {
        self.borrow_registry()?.unregister(owner)
    }

    /// Register `owner` for as long as the returned guard lives
    pub fn registration(&self, owner: &dyn Owner) -> Result<Registration> {
        Registration::new(&self.registry, owner)
    }

    /// Bring up the enabled subsystems and install the resulting chain.
    ///
    /// Returns the failure of the last subsystem that failed; the full list
    /// is available from [`LoggingSystem::last_report`].
    ///
    /// The backend's default level is only set when `default_severity` is
    /// given, so a level loaded from its own config file is kept otherwise.
    /// A failure to set that level counts as the external subsystem's
    /// failure, but the external sink is still attached since the backend
    /// is up.
    pub fn configure(&mut self, options: &LoggingOptions) -> Result<()> {
        let mut chain = DispatchChain::new();
        let mut report = ConfigureReport::default();
        let mut last_failure = None;

        if let Some(severity) = options.default_severity {
            self.output.set_threshold(severity);
        }

        if options.console_enabled {
            let outcome = chain.push((self.console)());
            settle(&mut report, &mut last_failure, Subsystem::Console, outcome);
        }

        if options.registry_enabled {
            let outcome = self
                .borrow_registry()
                .and_then(|mut registry| registry.init())
                .and_then(|()| chain.push(Box::new(RegistrySink::new(&self.registry))));
            settle(&mut report, &mut last_failure, Subsystem::Registry, outcome);
        }

        if options.external_enabled {
            let outcome = self.initialize_backend(options).and_then(|()| {
                let level = match options.default_severity {
                    Some(severity) => self.set_backend_level(severity),
                    None => Ok(()),
                };
                chain.push(Box::new(ExternalSink::new(&self.backend)))?;
                level
            });
            settle(&mut report, &mut last_failure, Subsystem::External, outcome);
        }

        info!(sinks = ?chain.sink_names(), "Installing dispatch chain");
        self.output.install(Box::new(chain));
        self.options = Some(options.clone());
        self.report = report;

        match last_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Fall back to the console and finalize the configured subsystems.
    ///
    /// A registry teardown failure is returned without touching the backend,
    /// and the system stays configured so the call can be retried.
    pub fn shutdown(&mut self) -> Result<()> {
        self.output.install((self.console)());

        let Some((registry_enabled, external_enabled)) = self
            .options
            .as_ref()
            .map(|o| (o.registry_enabled, o.external_enabled))
        else {
            debug!("Logging system not configured, nothing to shut down");
            return Ok(());
        };

        if registry_enabled {
            self.borrow_registry()?.fini()?;
        }

        if external_enabled {
            self.borrow_backend()?.shutdown()?;
        }

        self.options = None;
        info!("Logging system shut down");
        Ok(())
    }

    fn initialize_backend(&self, options: &LoggingOptions) -> Result<()> {
        let mut backend = self.borrow_backend()?;
        backend.initialize(options.external_config_path.as_deref())?;
        debug!(backend = backend.name(), "External backend initialized");
        Ok(())
    }

    fn set_backend_level(&self, severity: Severity) -> Result<()> {
        let mut backend = self.borrow_backend()?;
        backend.set_logger_level(None, severity).map_err(|e| {
            warn!(backend = backend.name(), error = %e, "Failed to set external backend severity");
            RelayError::from(e)
        })
    }

    fn borrow_registry(&self) -> Result<RefMut<'_, Registry>> {
        self.registry
            .try_borrow_mut()
            .map_err(|_| RelayError::RegistryBusy)
    }

    fn borrow_backend(&self) -> Result<RefMut<'_, dyn ExternalBackend + 'static>> {
        self.backend.try_borrow_mut().map_err(|_| {
            RelayError::Backend(BackendError::Initialize(
                "external backend is already borrowed".to_string(),
            ))
        })
    }
}

fn settle(
    report: &mut ConfigureReport,
    last_failure: &mut Option<RelayError>,
    subsystem: Subsystem,
    outcome: Result<()>,
) {
    report.record(subsystem, Status::from_result(&outcome));
    if let Err(e) = outcome {
        warn!(%subsystem, error = %e, "Subsystem failed to configure");
        *last_failure = Some(e);
    }
}
