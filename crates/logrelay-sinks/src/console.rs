use logrelay_core::{LogEvent, LogRecord, Sink, Stamp};
use std::cell::RefCell;
use std::io::{self, Stdout, Write};
use tracing::debug;

/// Output format for the console
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsoleFormat {
    /// `[INFO] [1700000000.000000123] [robot.nav]: hello`
    #[default]
    Pretty,
    /// The published record, one JSON object per line
    Json,
    /// Message only
    Raw,
}

impl ConsoleFormat {
    /// Parse a format name, falling back to `Pretty`
    pub fn parse(format: &str) -> Self {
        match format.to_lowercase().as_str() {
            "json" => Self::Json,
            "raw" => Self::Raw,
            _ => Self::Pretty,
        }
    }
}

/// Writes every log event as one line to a writer (stdout by default)
pub struct ConsoleSink<W: Write = Stdout> {
    format: ConsoleFormat,
    writer: RefCell<W>,
}

impl ConsoleSink<Stdout> {
    /// Create a console sink on stdout with default format
    pub fn new() -> Self {
        Self::with_format(ConsoleFormat::default())
    }

    /// Create a console sink on stdout with a specific format
    pub fn with_format(format: ConsoleFormat) -> Self {
        Self::with_writer(format, io::stdout())
    }
}

impl Default for ConsoleSink<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleSink<W> {
    /// Create a console sink writing to any writer
    pub fn with_writer(format: ConsoleFormat, writer: W) -> Self {
        Self {
            format,
            writer: RefCell::new(writer),
        }
    }

    pub fn format(&self) -> ConsoleFormat {
        self.format
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// Format an event according to the console format
    fn format_event(&self, event: &LogEvent<'_>) -> Result<String, serde_json::Error> {
        match self.format {
            ConsoleFormat::Pretty => Ok(format_pretty(event)),
            ConsoleFormat::Json => LogRecord::from(event).to_json(),
            ConsoleFormat::Raw => Ok(event.message.to_string()),
        }
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self
            .writer
            .try_borrow_mut()
            .map_err(|e| io::Error::new(io::ErrorKind::WouldBlock, e.to_string()))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

impl<W: Write> Sink for ConsoleSink<W> {
    fn name(&self) -> &'static str {
        "console"
    }

    fn handle(&self, event: &LogEvent<'_>) {
        let line = match self.format_event(event) {
            Ok(line) => line,
            Err(e) => {
                debug!(error = %e, "Failed to format log event for console");
                return;
            }
        };

        if let Err(e) = self.write_line(&line) {
            debug!(error = %e, "Failed to write log event to console");
        }
    }
}

/// Format an event in a human-readable way
fn format_pretty(event: &LogEvent<'_>) -> String {
    let mut line = format!(
        "[{}] [{}] [{}]: {}",
        event.severity,
        Stamp::from_nanos(event.timestamp_nanos),
        event.logger_name,
        event.message
    );

    if let Some(loc) = event.location {
        line.push_str(&format!(" ({}:{} in {})", loc.file, loc.line, loc.function));
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use logrelay_core::{LogLocation, Severity};

    fn event<'a>(msg: &'a str) -> LogEvent<'a> {
        LogEvent::new(Severity::Info, "robot.nav", 1_700_000_000_000_000_123, msg)
    }

    fn written(sink: ConsoleSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_format_pretty() {
        let sink = ConsoleSink::with_writer(ConsoleFormat::Pretty, Vec::new());
        sink.handle(&event("hello"));

        assert_eq!(
            written(sink),
            "[INFO] [1700000000.000000123] [robot.nav]: hello\n"
        );
    }

    #[test]
    fn test_format_pretty_with_location() {
        let sink = ConsoleSink::with_writer(ConsoleFormat::Pretty, Vec::new());
        let location = LogLocation {
            file: "src/nav.rs",
            function: "plan",
            line: 42,
        };
        sink.handle(&event("replanning").with_location(location));

        assert!(written(sink).ends_with("replanning (src/nav.rs:42 in plan)\n"));
    }

    #[test]
    fn test_format_json() {
        let sink = ConsoleSink::with_writer(ConsoleFormat::Json, Vec::new());
        sink.handle(&event("hello"));

        let output = written(sink);
        let record: LogRecord = serde_json::from_str(output.trim_end()).unwrap();
        assert_eq!(record.msg, "hello");
        assert_eq!(record.level, Severity::Info.as_i32());
    }

    #[test]
    fn test_format_raw() {
        let sink = ConsoleSink::with_writer(ConsoleFormat::Raw, Vec::new());
        sink.handle(&event("first"));
        sink.handle(&event("second"));

        assert_eq!(written(sink), "first\nsecond\n");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(ConsoleFormat::parse("json"), ConsoleFormat::Json);
        assert_eq!(ConsoleFormat::parse("RAW"), ConsoleFormat::Raw);
        assert_eq!(ConsoleFormat::parse("fancy"), ConsoleFormat::Pretty);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let sink = ConsoleSink::with_writer(ConsoleFormat::Pretty, Broken);
        sink.handle(&event("lost"));
    }
}
