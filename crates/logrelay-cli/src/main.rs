use anyhow::{Context, Result};
use clap::Parser;
use logrelay_core::{log_location, Config, LogEvent, NodeOwner, OwnerId, Severity};
use logrelay_dispatch::LoggingSystem;
use logrelay_sinks::{shared_backend, TracingBackend};
use logrelay_transport::JsonLinesTransport;
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// LogRelay - route log lines to the console, per-logger endpoints and tracing
#[derive(Parser, Debug)]
#[command(name = "logrelay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Default severity, by name or level (negative leaves it unset)
    #[arg(short, long, allow_hyphen_values = true)]
    log_level: Option<String>,

    /// Do not write events to the console
    #[arg(long)]
    disable_console_logs: bool,

    /// Do not publish events on per-logger endpoints
    #[arg(long)]
    disable_registry_logs: bool,

    /// Do not forward events to the tracing backend
    #[arg(long)]
    disable_external_logs: bool,

    /// Configuration file for the tracing backend
    #[arg(long)]
    log_config_file: Option<PathBuf>,

    /// Console format: pretty, json, or raw (overrides config)
    #[arg(short, long)]
    format: Option<String>,

    /// File the endpoints append published records to, one JSON object per line
    #[arg(short, long, default_value = "rosout.jsonl")]
    output: PathBuf,

    /// Namespace of the node logging the input
    #[arg(long, default_value = "/")]
    namespace: String,

    /// Name of the node logging the input
    #[arg(long, default_value = "relay")]
    name: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

/// Parse a severity given either as a name or as a raw level
fn parse_level(level: &str) -> Result<Option<Severity>> {
    match level.trim().parse::<i32>() {
        Ok(raw) => Ok(Severity::from_level(raw)?),
        Err(_) => Ok(Some(level.parse()?)),
    }
}

/// Split an input line into its severity and message.
///
/// `warn: low battery` is logged at WARN; lines without a recognised prefix
/// are logged at INFO as-is.
fn parse_line(line: &str) -> (Severity, &str) {
    if let Some((prefix, message)) = line.split_once(':') {
        if let Ok(severity) = prefix.parse::<Severity>() {
            return (severity, message.trim_start());
        }
    }
    (Severity::Info, line)
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        Some(ref path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(ref level) = args.log_level {
        config.logging.default_severity = parse_level(level)?;
    }
    if args.disable_console_logs {
        config.logging.console_enabled = false;
    }
    if args.disable_registry_logs {
        config.logging.registry_enabled = false;
    }
    if args.disable_external_logs {
        config.logging.external_enabled = false;
    }
    if let Some(ref path) = args.log_config_file {
        config.logging.external_config_path = Some(path.clone());
    }
    if let Some(ref format) = args.format {
        config.console.format = format.clone();
    }

    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    // Handle --print-config
    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    // Forwarded events arrive through tracing, so a subscriber is always installed
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let transport = JsonLinesTransport::open(&args.output)
        .with_context(|| format!("Failed to open {}", args.output.display()))?;
    let mut system =
        LoggingSystem::from_config(&config, transport, shared_backend(TracingBackend::new()));

    if let Err(e) = system.configure(&config.logging) {
        warn!(
            error = %e,
            failures = ?system.last_report().failures(),
            "Logging configured with failures"
        );
    }

    let owner = NodeOwner::new(OwnerId::new(1), args.namespace.as_str(), args.name.as_str());
    let registration = system.registration(&owner)?;
    info!(logger = registration.logger_name(), output = %args.output.display(), "Relaying stdin");

    let mut relayed: u64 = 0;
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let (severity, message) = parse_line(&line);
        let event = LogEvent::now(severity, registration.logger_name(), message)
            .with_location(log_location!());
        system.log(&event);
        relayed += 1;
    }

    registration.release()?;
    system.shutdown()?;

    if args.verbose {
        info!(relayed, "Relay complete");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_with_prefix() {
        assert_eq!(parse_line("warn: low battery"), (Severity::Warn, "low battery"));
        assert_eq!(parse_line("ERROR:stalled"), (Severity::Error, "stalled"));
    }

    #[test]
    fn test_parse_line_without_prefix() {
        assert_eq!(parse_line("hello"), (Severity::Info, "hello"));
        assert_eq!(
            parse_line("eta: 5 minutes"),
            (Severity::Info, "eta: 5 minutes")
        );
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("warn").unwrap(), Some(Severity::Warn));
        assert_eq!(parse_level("40").unwrap(), Some(Severity::Error));
        assert_eq!(parse_level("-1").unwrap(), None);
        assert!(parse_level("15").is_err());
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "logrelay",
            "--log-level",
            "debug",
            "--disable-external-logs",
            "--format",
            "json",
        ]);
        let config = load_config(&args).unwrap();

        assert_eq!(config.logging.default_severity, Some(Severity::Debug));
        assert!(config.logging.console_enabled);
        assert!(!config.logging.external_enabled);
        assert_eq!(config.console.format, "json");
    }
}
