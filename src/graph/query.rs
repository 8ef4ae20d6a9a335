//! Query builder for fluent J1QL query construction.

use futures::TryStreamExt;

use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::QueryExecutor;

/// A J1QL query bound to the executor that will run it.
///
/// # Example
///
/// ```ignore
/// let rows = Query::new(&client, "FIND DomainRecord")
///     .fetch_all()
///     .await?;
/// ```
pub struct Query<'a, E: QueryExecutor + ?Sized> {
    executor: &'a E,
    j1ql: String,
}

impl<'a, E: QueryExecutor + ?Sized> Query<'a, E> {
    /// Creates a new query builder.
    pub fn new(executor: &'a E, j1ql: &str) -> Self {
        Self {
            executor,
            j1ql: j1ql.to_string(),
        }
    }

    /// Executes the query and returns a stream of rows.
    ///
    /// Further pages are requested as the stream is consumed.
    pub async fn execute(self) -> Result<RowStream<'a>, AppError> {
        self.executor.execute_query(&self.j1ql, Params::new()).await
    }

    /// Executes the query and collects every page into a vector.
    pub async fn fetch_all(self) -> Result<Vec<Row>, AppError> {
        self.execute().await?.try_collect().await
    }
}

/// Extension trait providing a convenient `query()` method.
///
/// Implemented for every [`QueryExecutor`], including trait objects, so
/// `graph.query("...")` works on an `Arc<dyn GraphClient>`.
pub trait QueryExt: QueryExecutor {
    /// Creates a new query builder for this executor.
    fn query(&self, j1ql: &str) -> Query<'_, Self> {
        Query::new(self, j1ql)
    }
}

impl<E: QueryExecutor + ?Sized> QueryExt for E {}
