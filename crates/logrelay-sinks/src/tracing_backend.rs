//! `tracing`-backed external logging backend
//!
//! Forwards log events into the `tracing` ecosystem so whatever subscriber the
//! application installed (fmt, JSON, OpenTelemetry, ...) receives them.
//!
//! The optional config file is TOML:
//!
//! ```toml
//! level = "info"
//!
//! [loggers]
//! "robot.nav" = "debug"
//! ```

use logrelay_core::{BackendError, ExternalBackend, Severity};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Target every forwarded event is emitted under
pub const TRACING_TARGET: &str = "logrelay";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BackendConfig {
    level: Option<Severity>,
    loggers: HashMap<String, Severity>,
}

/// External backend emitting `tracing` events
#[derive(Debug, Default)]
pub struct TracingBackend {
    initialized: bool,
    default_level: Severity,
    logger_levels: HashMap<String, Severity>,
}

impl TracingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether an event of `severity` from `logger_name` would be forwarded
    pub fn is_enabled_for(&self, logger_name: &str, severity: Severity) -> bool {
        if !self.initialized {
            return false;
        }
        let threshold = self
            .logger_levels
            .get(logger_name)
            .copied()
            .unwrap_or(self.default_level);
        severity >= threshold
    }

    fn load_config(path: &Path) -> Result<BackendConfig, BackendError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BackendError::Initialize(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            BackendError::Initialize(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

impl ExternalBackend for TracingBackend {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn initialize(&mut self, config_path: Option<&Path>) -> Result<(), BackendError> {
        let config = match config_path {
            Some(path) => Self::load_config(path)?,
            None => BackendConfig::default(),
        };

        self.default_level = config.level.unwrap_or_default();
        self.logger_levels = config.loggers;
        self.initialized = true;
        Ok(())
    }

    fn set_logger_level(
        &mut self,
        logger: Option<&str>,
        severity: Severity,
    ) -> Result<(), BackendError> {
        match logger {
            Some(name) => {
                self.logger_levels.insert(name.to_string(), severity);
            }
            None => self.default_level = severity,
        }
        Ok(())
    }

    fn log(&self, severity: Severity, logger_name: &str, message: &str) {
        if !self.is_enabled_for(logger_name, severity) {
            return;
        }

        match severity {
            Severity::Unset | Severity::Debug => {
                debug!(target: TRACING_TARGET, logger = logger_name, "{}", message)
            }
            Severity::Info => info!(target: TRACING_TARGET, logger = logger_name, "{}", message),
            Severity::Warn => warn!(target: TRACING_TARGET, logger = logger_name, "{}", message),
            Severity::Error => error!(target: TRACING_TARGET, logger = logger_name, "{}", message),
            Severity::Fatal => {
                error!(target: TRACING_TARGET, logger = logger_name, fatal = true, "{}", message)
            }
        }
    }

    fn shutdown(&mut self) -> Result<(), BackendError> {
        self.initialized = false;
        self.logger_levels.clear();
        self.default_level = Severity::Unset;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_disabled_until_initialized() {
        let mut backend = TracingBackend::new();
        assert!(!backend.is_enabled_for("robot.nav", Severity::Fatal));

        backend.initialize(None).unwrap();
        assert!(backend.is_initialized());
        assert!(backend.is_enabled_for("robot.nav", Severity::Debug));
    }

    #[test]
    fn test_default_level_filters() {
        let mut backend = TracingBackend::new();
        backend.initialize(None).unwrap();
        backend.set_logger_level(None, Severity::Warn).unwrap();

        assert!(!backend.is_enabled_for("robot.nav", Severity::Info));
        assert!(backend.is_enabled_for("robot.nav", Severity::Warn));
        assert!(backend.is_enabled_for("robot.nav", Severity::Fatal));
    }

    #[test]
    fn test_logger_level_overrides_default() {
        let mut backend = TracingBackend::new();
        backend.initialize(None).unwrap();
        backend.set_logger_level(None, Severity::Error).unwrap();
        backend
            .set_logger_level(Some("robot.nav"), Severity::Debug)
            .unwrap();

        assert!(backend.is_enabled_for("robot.nav", Severity::Debug));
        assert!(!backend.is_enabled_for("robot.arm", Severity::Warn));
    }

    #[test]
    fn test_initialize_from_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "level = \"warn\"\n\n[loggers]\n\"robot.nav\" = \"debug\"").unwrap();

        let mut backend = TracingBackend::new();
        backend.initialize(Some(file.path())).unwrap();

        assert!(!backend.is_enabled_for("robot.arm", Severity::Info));
        assert!(backend.is_enabled_for("robot.nav", Severity::Debug));
    }

    #[test]
    fn test_initialize_with_missing_file_fails() {
        let mut backend = TracingBackend::new();
        let err = backend
            .initialize(Some(Path::new("/nonexistent/logrelay/backend.toml")))
            .unwrap_err();

        assert!(matches!(err, BackendError::Initialize(_)));
        assert!(!backend.is_initialized());
    }

    #[test]
    fn test_shutdown_disables() {
        let mut backend = TracingBackend::new();
        backend.initialize(None).unwrap();
        backend.shutdown().unwrap();

        assert!(!backend.is_enabled_for("robot.nav", Severity::Fatal));
        // Logging after shutdown is a no-op rather than an error
        backend.log(Severity::Error, "robot.nav", "ignored");
    }
}
