//! Core traits for graph store abstraction.
//!
//! This module defines the trait hierarchy that backends must implement:
//!
//! - [`QueryExecutor`] - Run J1QL queries
//! - [`BulkUploader`] - Push entities and relationships in one sync job
//! - [`GraphClient`] - Both of the above, the type held by the context

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::row::{Params, RowStream};
use crate::models::{BulkUpload, SyncJob};

/// Executes J1QL queries against a graph store.
///
/// Implementations are responsible for pagination; the returned stream
/// yields every matching row.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes a query and returns a stream of result rows.
    ///
    /// # Arguments
    ///
    /// * `j1ql` - The J1QL query string
    /// * `params` - Variables to bind to the query
    async fn execute_query(&self, j1ql: &str, params: Params) -> Result<RowStream<'_>, AppError>;
}

/// Uploads a batch of graph objects under a scope.
#[async_trait]
pub trait BulkUploader: Send + Sync {
    /// Uploads all entities and relationships and finalizes the job.
    ///
    /// Returns the finalized job, including its counters.
    async fn bulk_upload(&self, upload: &BulkUpload) -> Result<SyncJob, AppError>;
}

/// A graph store that can both be queried and written to.
pub trait GraphClient: QueryExecutor + BulkUploader {}

impl<T: QueryExecutor + BulkUploader> GraphClient for T {}
