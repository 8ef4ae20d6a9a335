//! Relationships linking domain records to discovered hosts.

use serde::Serialize;

use crate::models::{DomainRecord, HostEntity};

const EDGE_TYPE: &str = "domain_record_connects_discovered_host";
const EDGE_CLASS: &str = "CONNECTS";

/// Returns the edge key: `<recordKey>|connects|<hostKey>`.
pub fn edge_key(record_key: &str, host_key: &str) -> String {
    format!("{}|connects|{}", record_key, host_key)
}

/// A `DomainRecord -CONNECTS-> discovered_host` edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionEdge {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub edge_type: &'static str,
    #[serde(rename = "_class")]
    pub class: &'static str,
    #[serde(rename = "_fromEntityId")]
    pub from_entity_id: String,
    #[serde(rename = "_fromEntityKey")]
    pub from_entity_key: String,
    #[serde(rename = "_toEntityKey")]
    pub to_entity_key: String,
    #[serde(rename = "displayName")]
    pub display_name: &'static str,
}

impl ConnectionEdge {
    pub fn connect(record: &DomainRecord, host: &HostEntity) -> Self {
        Self {
            key: edge_key(&record.key, &host.key),
            edge_type: EDGE_TYPE,
            class: EDGE_CLASS,
            from_entity_id: record.id.clone(),
            from_entity_key: record.key.clone(),
            to_entity_key: host.key.clone(),
            display_name: EDGE_CLASS,
        }
    }
}
