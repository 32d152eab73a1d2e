use crate::error::RelayError;
use crate::event::Severity;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for LogRelay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which sinks are enabled and the default severity
    pub logging: LoggingOptions,

    /// Registry and endpoint settings
    pub registry: RegistryConfig,

    /// Console sink settings
    pub console: ConsoleConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, RelayError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, RelayError> {
        toml::from_str(content)
            .map_err(|e| RelayError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, RelayError> {
        toml::to_string_pretty(self)
            .map_err(|e| RelayError::Config(format!("Failed to serialize config: {}", e)))
    }
}

/// Options consumed by `LoggingSystem::configure`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default severity, by name or raw level; `None` leaves the current threshold untouched
    #[serde(deserialize_with = "severity_or_level")]
    pub default_severity: Option<Severity>,

    /// Write every event to the console
    pub console_enabled: bool,

    /// Publish events on per-logger endpoints
    pub registry_enabled: bool,

    /// Forward events to the external backend
    pub external_enabled: bool,

    /// Backend-specific configuration file
    pub external_config_path: Option<PathBuf>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            default_severity: None,
            console_enabled: true,
            registry_enabled: true,
            external_enabled: true,
            external_config_path: None,
        }
    }
}

impl LoggingOptions {
    /// Set the default severity from a raw level, negative meaning unset
    pub fn with_level(mut self, level: i32) -> Result<Self, RelayError> {
        self.default_severity = Severity::from_level(level)?;
        Ok(self)
    }
}

/// Accept `"warn"` as well as `30`, with negative levels meaning unset
fn severity_or_level<'de, D>(deserializer: D) -> Result<Option<Severity>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Level(i32),
        Name(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Level(level) => Severity::from_level(level).map_err(de::Error::custom),
        Raw::Name(name) => name.parse().map(Some).map_err(de::Error::custom),
    }
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Topic every logger endpoint publishes on
    pub topic: String,

    /// Number of loggers the map is sized for up front
    pub initial_capacity: usize,

    /// Upper bound on registered loggers; further registrations fail with `BadAlloc`
    pub max_loggers: Option<usize>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            topic: "rosout".to_string(),
            initial_capacity: 2,
            max_loggers: None,
        }
    }
}

/// Console sink configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Format: pretty, json, raw
    pub format: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            format: "pretty".to_string(),
        }
    }
}
