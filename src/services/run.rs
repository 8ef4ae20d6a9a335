//! State accumulated over one sync run.

use std::collections::HashMap;
use std::net::IpAddr;

use crate::models::{BulkUpload, ConnectionEdge, DomainRecord, HostEntity};

/// Result of one enrichment step for a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step ran and its fields were merged.
    Complete,
    /// The step failed; the host keeps the fields it already had.
    Partial(String),
    /// The step did not apply (host reused, or port not open).
    Skipped,
}

impl StepOutcome {
    pub fn is_partial(&self) -> bool {
        matches!(self, StepOutcome::Partial(_))
    }
}

/// Terminal state of a single domain record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record has no hostname value.
    Ignored,
    /// Resolution failed; the hostname is on the skip list.
    Skipped { hostname: String, reason: String },
    /// An edge to the host was added.
    Linked {
        host_key: String,
        /// `false` when an earlier record already produced the host.
        new_host: bool,
        intel: StepOutcome,
        certificate: StepOutcome,
    },
}

/// Hosts, edges and skipped hostnames collected by one run.
///
/// Hosts are unique by address and kept in first-seen order.
#[derive(Debug, Default)]
pub struct SyncRun {
    by_address: HashMap<IpAddr, usize>,
    entities: Vec<HostEntity>,
    relationships: Vec<ConnectionEdge>,
    skipped: Vec<String>,
}

impl SyncRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, address: IpAddr) -> bool {
        self.by_address.contains_key(&address)
    }

    /// Adds a host unless one already exists for its address.
    ///
    /// Returns `false` and discards `host` on a duplicate.
    pub fn insert_host(&mut self, host: HostEntity) -> bool {
        let address = host.address();
        if self.contains(address) {
            return false;
        }
        self.by_address.insert(address, self.entities.len());
        self.entities.push(host);
        true
    }

    /// Connects `record` to the host at `address`.
    ///
    /// Returns `None` if no host exists for the address.
    pub fn link(&mut self, record: &DomainRecord, address: IpAddr) -> Option<&ConnectionEdge> {
        let &index = self.by_address.get(&address)?;
        let edge = ConnectionEdge::connect(record, &self.entities[index]);
        self.relationships.push(edge);
        self.relationships.last()
    }

    pub fn skip(&mut self, hostname: impl Into<String>) {
        self.skipped.push(hostname.into());
    }

    pub fn entities(&self) -> &[HostEntity] {
        &self.entities
    }

    pub fn relationships(&self) -> &[ConnectionEdge] {
        &self.relationships
    }

    /// Hostnames that failed to resolve, in encounter order.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// Builds the upload payload for `scope`.
    pub fn to_upload(&self, scope: &str) -> BulkUpload {
        BulkUpload {
            scope: scope.to_string(),
            entities: self.entities.clone(),
            relationships: self.relationships.clone(),
        }
    }
}
