use logrelay_core::{Endpoint, LogRecord, OwnerId, Transport, TransportError};
use serde::Serialize;
use std::cell::RefCell;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// One published record as written to the file
#[derive(Debug, Serialize)]
struct PublishedLine<'a> {
    topic: &'a str,
    owner: OwnerId,
    #[serde(flatten)]
    record: &'a LogRecord,
}

/// Transport whose endpoints append published records to a JSON Lines file.
///
/// All endpoints share one writer; every line is flushed as it is written so
/// a crash loses at most the record being published.
pub struct JsonLinesTransport {
    path: PathBuf,
    writer: Rc<RefCell<BufWriter<File>>>,
    live: usize,
}

impl JsonLinesTransport {
    /// Open (or create) the output file in append mode
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), "Opened JSON Lines transport");

        Ok(Self {
            path,
            writer: Rc::new(RefCell::new(BufWriter::new(file))),
            live: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Endpoints created and not yet destroyed
    pub fn live_endpoints(&self) -> usize {
        self.live
    }
}

impl Transport for JsonLinesTransport {
    fn create_endpoint(
        &mut self,
        owner: OwnerId,
        topic: &str,
    ) -> Result<Box<dyn Endpoint>, TransportError> {
        self.live += 1;
        debug!(%owner, topic, "Created JSON Lines endpoint");

        Ok(Box::new(JsonLinesEndpoint {
            owner,
            topic: topic.to_string(),
            writer: Rc::clone(&self.writer),
        }))
    }

    fn destroy_endpoint(
        &mut self,
        owner: OwnerId,
        _endpoint: &mut dyn Endpoint,
    ) -> Result<(), TransportError> {
        self.writer
            .try_borrow_mut()
            .map_err(|e| TransportError::Destroy(e.to_string()))?
            .flush()?;

        self.live = self.live.saturating_sub(1);
        debug!(%owner, "Destroyed JSON Lines endpoint");
        Ok(())
    }
}

impl Drop for JsonLinesTransport {
    fn drop(&mut self) {
        if self.live > 0 {
            warn!(
                endpoints = self.live,
                path = %self.path.display(),
                "JSON Lines transport dropped with live endpoints"
            );
        }
        if let Ok(mut writer) = self.writer.try_borrow_mut() {
            let _ = writer.flush();
        }
    }
}

/// Endpoint writing records for one owner
pub struct JsonLinesEndpoint {
    owner: OwnerId,
    topic: String,
    writer: Rc<RefCell<BufWriter<File>>>,
}

impl Endpoint for JsonLinesEndpoint {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&self, record: &LogRecord) -> Result<(), TransportError> {
        let line = PublishedLine {
            topic: &self.topic,
            owner: self.owner,
            record,
        };

        let mut writer = self
            .writer
            .try_borrow_mut()
            .map_err(|e| TransportError::Publish(e.to_string()))?;

        serde_json::to_writer(&mut *writer, &line)
            .map_err(|e| TransportError::Serialization(e.to_string()))?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logrelay_core::{LogEvent, Severity};
    use tempfile::TempDir;

    #[test]
    fn test_publish_writes_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rosout.jsonl");
        let mut transport = JsonLinesTransport::open(&path).unwrap();

        let mut endpoint = transport.create_endpoint(OwnerId::new(7), "rosout").unwrap();
        let event = LogEvent::new(Severity::Info, "robot.nav", 3_000_000_004, "hello");
        endpoint.publish(&LogRecord::from(&event)).unwrap();
        endpoint.publish(&LogRecord::from(&event)).unwrap();
        transport
            .destroy_endpoint(OwnerId::new(7), endpoint.as_mut())
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["topic"], "rosout");
        assert_eq!(value["owner"], 7);
        assert_eq!(value["name"], "robot.nav");
        assert_eq!(value["msg"], "hello");
        assert_eq!(value["level"], 20);
        assert_eq!(value["stamp"]["sec"], 3);
        assert_eq!(value["stamp"]["nanosec"], 4);
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.jsonl");

        let transport = JsonLinesTransport::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(transport.path(), path.as_path());
    }

    #[test]
    fn test_live_endpoint_count() {
        let dir = TempDir::new().unwrap();
        let mut transport = JsonLinesTransport::open(dir.path().join("out.jsonl")).unwrap();

        let mut a = transport.create_endpoint(OwnerId::new(1), "rosout").unwrap();
        let _b = transport.create_endpoint(OwnerId::new(2), "rosout").unwrap();
        assert_eq!(transport.live_endpoints(), 2);

        transport.destroy_endpoint(OwnerId::new(1), a.as_mut()).unwrap();
        assert_eq!(transport.live_endpoints(), 1);
    }
}
