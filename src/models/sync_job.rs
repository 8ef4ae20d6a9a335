//! Bulk upload payloads and synchronization job results.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::models::{ConnectionEdge, HostEntity};

/// Everything a run sends to the graph in one upload.
#[derive(Debug, Clone, Serialize)]
pub struct BulkUpload {
    pub scope: String,
    pub entities: Vec<HostEntity>,
    pub relationships: Vec<ConnectionEdge>,
}

/// A finalized synchronization job as reported by the graph service.
///
/// Only `id` and `status` are typed; the service reports a growing set of
/// counters (`numEntitiesUploaded`, `numRelationshipsCreated`, ...) which
/// are kept as-is for the report.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SyncJob {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub properties: Map<String, JsonValue>,
}

impl SyncJob {
    /// Numeric value of a job property, if present.
    pub fn counter(&self, name: &str) -> Option<i64> {
        self.properties.get(name).and_then(JsonValue::as_i64)
    }

    pub fn property(&self, name: &str) -> Option<&JsonValue> {
        self.properties.get(name)
    }
}
