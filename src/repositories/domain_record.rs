//! Domain record repository: selects unsynced DNS records and uploads results.

use crate::context::{AppGraph, Context};
use crate::di::FromRef;
use crate::error::AppError;
use crate::graph::QueryExt;
use crate::j1ql;
use crate::models::{BulkUpload, DomainRecord, SyncJob};

/// Record types that name a host.
const RECORD_TYPES: &[&str] = &["A", "AAAA", "CNAME"];

/// Builds the query for records with a value and no host linked under `scope`.
pub fn unlinked_records_query(scope: &str) -> String {
    let types = RECORD_TYPES
        .iter()
        .map(|t| format!("'{}'", t))
        .collect::<Vec<_>>()
        .join(" or ");
    format!(
        "find DomainRecord with value!=undefined and type=({}) that !connects * with _scope!='{}'",
        types,
        scope.replace('\\', "\\\\").replace('\'', "\\'")
    )
}

/// Repository for DomainRecord reads and the host upload.
#[derive(Clone)]
pub struct DomainRecordRepository {
    graph: AppGraph,
}

impl FromRef<Context> for DomainRecordRepository {
    fn from_ref(ctx: &Context) -> Self {
        Self::new(AppGraph::from_ref(ctx))
    }
}

impl DomainRecordRepository {
    pub fn new(graph: AppGraph) -> Self {
        Self { graph }
    }

    /// Find records that are not yet connected to a host under `scope`.
    ///
    /// Rows that cannot be decoded are logged and dropped.
    pub async fn find_unlinked(&self, scope: &str) -> Result<Vec<DomainRecord>, AppError> {
        let query = unlinked_records_query(scope);
        tracing::debug!(query = %query, "Querying unlinked domain records");

        let rows = j1ql!(self.graph, &query).fetch_all().await?;
        let total = rows.len();

        let records: Vec<DomainRecord> = rows
            .iter()
            .filter_map(|row| match DomainRecord::from_row(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping undecodable DomainRecord row");
                    None
                }
            })
            .collect();

        tracing::info!(
            found = total,
            usable = records.len(),
            "Fetched unlinked domain records"
        );
        Ok(records)
    }

    /// Upload hosts and edges in one synchronization job.
    pub async fn upload(&self, upload: &BulkUpload) -> Result<SyncJob, AppError> {
        self.graph.bulk_upload(upload).await
    }
}
