use crate::error::RelayError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Log severity, ordered from least to most severe.
///
/// The discriminants are the wire values carried in [`LogRecord::level`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Unset = 0,
    Debug = 10,
    Info = 20,
    Warn = 30,
    Error = 40,
    Fatal = 50,
}

impl Severity {
    /// Wire value of this severity
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a raw level onto a severity, where negative levels mean "not set".
    ///
    /// Non-negative levels other than the wire values are rejected.
    pub fn from_level(level: i32) -> Result<Option<Self>, RelayError> {
        if level < 0 {
            Ok(None)
        } else {
            Self::try_from(level).map(Some)
        }
    }
}

impl TryFrom<i32> for Severity {
    type Error = RelayError;

    fn try_from(value: i32) -> Result<Self, RelayError> {
        match value {
            0 => Ok(Severity::Unset),
            10 => Ok(Severity::Debug),
            20 => Ok(Severity::Info),
            30 => Ok(Severity::Warn),
            40 => Ok(Severity::Error),
            50 => Ok(Severity::Fatal),
            other => Err(RelayError::InvalidArgument(format!(
                "unknown severity level {}",
                other
            ))),
        }
    }
}

impl FromStr for Severity {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unset" => Ok(Severity::Unset),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(RelayError::InvalidArgument(format!(
                "unknown severity '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Unset => write!(f, "UNSET"),
            Severity::Debug => write!(f, "DEBUG"),
            Severity::Info => write!(f, "INFO"),
            Severity::Warn => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Source location of a log call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLocation<'a> {
    pub file: &'a str,
    pub function: &'a str,
    pub line: u32,
}

/// Captures the [`LogLocation`] of the call site.
///
/// Rust has no stable `function!()`, so the module path stands in for the function name.
#[macro_export]
macro_rules! log_location {
    () => {
        $crate::LogLocation {
            file: file!(),
            function: module_path!(),
            line: line!(),
        }
    };
}

/// A single log event as handed to the output handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEvent<'a> {
    /// Where the event was logged, if known
    pub location: Option<LogLocation<'a>>,

    pub severity: Severity,

    /// Logger the event was logged under
    pub logger_name: &'a str,

    /// Nanoseconds since the Unix epoch
    pub timestamp_nanos: i64,

    pub message: &'a str,
}

impl<'a> LogEvent<'a> {
    /// Create an event without a source location
    pub fn new(
        severity: Severity,
        logger_name: &'a str,
        timestamp_nanos: i64,
        message: &'a str,
    ) -> Self {
        Self {
            location: None,
            severity,
            logger_name,
            timestamp_nanos,
            message,
        }
    }

    /// Create an event stamped with the current wall-clock time
    pub fn now(severity: Severity, logger_name: &'a str, message: &'a str) -> Self {
        let timestamp_nanos = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        Self::new(severity, logger_name, timestamp_nanos, message)
    }

    /// Attach a source location
    pub fn with_location(mut self, location: LogLocation<'a>) -> Self {
        self.location = Some(location);
        self
    }
}

/// Wall-clock time split into seconds and nanoseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub sec: i32,
    pub nanosec: u32,
}

impl Stamp {
    /// Split a nanosecond timestamp. Seconds saturate at the `i32` range.
    pub fn from_nanos(nanos: i64) -> Self {
        let secs = nanos.div_euclid(NANOS_PER_SEC);
        let sec = i32::try_from(secs).unwrap_or(if secs < 0 { i32::MIN } else { i32::MAX });
        // rem_euclid is always in 0..NANOS_PER_SEC
        let nanosec = nanos.rem_euclid(NANOS_PER_SEC) as u32;
        Self { sec, nanosec }
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nanosec)
    }
}

/// Structured log record published on a logger's endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub stamp: Stamp,

    /// Severity wire value, see [`Severity::as_i32`]
    pub level: i32,

    /// Logger name
    pub name: String,

    pub msg: String,

    /// Empty when the event carried no location
    pub file: String,

    /// Empty when the event carried no location
    pub function: String,

    /// Zero when the event carried no location
    pub line: u32,
}

impl LogRecord {
    /// Severity of the record, if the level is a known value
    pub fn severity(&self) -> Option<Severity> {
        Severity::try_from(self.level).ok()
    }

    /// Serialize as a single JSON line
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<&LogEvent<'_>> for LogRecord {
    fn from(event: &LogEvent<'_>) -> Self {
        let (file, function, line) = match event.location {
            Some(loc) => (loc.file.to_string(), loc.function.to_string(), loc.line),
            None => (String::new(), String::new(), 0),
        };

        Self {
            stamp: Stamp::from_nanos(event.timestamp_nanos),
            level: event.severity.as_i32(),
            name: event.logger_name.to_string(),
            msg: event.message.to_string(),
            file,
            function,
            line,
        }
    }
}
