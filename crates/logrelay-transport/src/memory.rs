//! In-memory transport
//!
//! Keeps every published record in a shared journal. Used by the tests of the
//! other crates, and scriptable to fail a given create/destroy call so the
//! registry's rollback and teardown paths can be exercised.

use logrelay_core::{Endpoint, LogRecord, OwnerId, Transport, TransportError};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Default)]
struct Journal {
    create_calls: usize,
    destroy_calls: usize,
    fail_create_on: Option<usize>,
    fail_destroy_on: Option<usize>,
    fail_publish: bool,
    created: Vec<OwnerId>,
    destroyed: Vec<OwnerId>,
    published: Vec<(OwnerId, LogRecord)>,
}

/// Transport recording every call in a journal shared by all its clones
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    journal: Rc<RefCell<Journal>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `call`-th create call (1-based, counted over the transport's lifetime) fail
    pub fn fail_create_on(&self, call: usize) {
        self.journal.borrow_mut().fail_create_on = Some(call);
    }

    /// Make the `call`-th destroy call (1-based, counted over the transport's lifetime) fail
    pub fn fail_destroy_on(&self, call: usize) {
        self.journal.borrow_mut().fail_destroy_on = Some(call);
    }

    /// Make every publish fail while `fail` is set
    pub fn fail_publish(&self, fail: bool) {
        self.journal.borrow_mut().fail_publish = fail;
    }

    /// Number of create calls made, failed ones included
    pub fn create_calls(&self) -> usize {
        self.journal.borrow().create_calls
    }

    /// Number of destroy calls made, failed ones included
    pub fn destroy_calls(&self) -> usize {
        self.journal.borrow().destroy_calls
    }

    /// Owners of successfully created endpoints, in creation order
    pub fn created(&self) -> Vec<OwnerId> {
        self.journal.borrow().created.clone()
    }

    /// Owners of successfully destroyed endpoints, in destruction order
    pub fn destroyed(&self) -> Vec<OwnerId> {
        self.journal.borrow().destroyed.clone()
    }

    /// Endpoints created and not yet destroyed
    pub fn live_endpoints(&self) -> usize {
        let journal = self.journal.borrow();
        journal.created.len().saturating_sub(journal.destroyed.len())
    }

    /// Every record published so far
    pub fn published(&self) -> Vec<LogRecord> {
        self.journal
            .borrow()
            .published
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Records published on endpoints owned by `owner`
    pub fn published_by(&self, owner: OwnerId) -> Vec<LogRecord> {
        self.journal
            .borrow()
            .published
            .iter()
            .filter(|(o, _)| *o == owner)
            .map(|(_, record)| record.clone())
            .collect()
    }

    pub fn publish_count(&self) -> usize {
        self.journal.borrow().published.len()
    }
}

impl Transport for MemoryTransport {
    fn create_endpoint(
        &mut self,
        owner: OwnerId,
        topic: &str,
    ) -> Result<Box<dyn Endpoint>, TransportError> {
        let mut journal = self.journal.borrow_mut();
        journal.create_calls += 1;

        if journal.fail_create_on == Some(journal.create_calls) {
            return Err(TransportError::Create {
                topic: topic.to_string(),
                message: format!("scripted failure on create call {}", journal.create_calls),
            });
        }

        journal.created.push(owner);
        debug!(%owner, topic, "Created in-memory endpoint");

        Ok(Box::new(MemoryEndpoint {
            owner,
            topic: topic.to_string(),
            journal: Rc::clone(&self.journal),
        }))
    }

    fn destroy_endpoint(
        &mut self,
        owner: OwnerId,
        _endpoint: &mut dyn Endpoint,
    ) -> Result<(), TransportError> {
        let mut journal = self.journal.borrow_mut();
        journal.destroy_calls += 1;

        if journal.fail_destroy_on == Some(journal.destroy_calls) {
            return Err(TransportError::Destroy(format!(
                "scripted failure on destroy call {}",
                journal.destroy_calls
            )));
        }

        journal.destroyed.push(owner);
        debug!(%owner, "Destroyed in-memory endpoint");
        Ok(())
    }
}

/// Endpoint appending to its transport's journal
pub struct MemoryEndpoint {
    owner: OwnerId,
    topic: String,
    journal: Rc<RefCell<Journal>>,
}

impl Endpoint for MemoryEndpoint {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&self, record: &LogRecord) -> Result<(), TransportError> {
        let mut journal = self
            .journal
            .try_borrow_mut()
            .map_err(|e| TransportError::Publish(e.to_string()))?;

        if journal.fail_publish {
            return Err(TransportError::Publish("scripted publish failure".to_string()));
        }

        journal.published.push((self.owner, record.clone()));
        Ok(())
    }
}
