//! Macro for convenient J1QL query construction.

/// Macro for inline J1QL queries.
///
/// # Usage
///
/// ```ignore
/// use hostsync::graph::j1ql;
///
/// let rows = j1ql!(graph, "FIND DomainRecord").fetch_all().await?;
/// ```
#[macro_export]
macro_rules! j1ql {
    ($graph:expr, $query:expr $(,)?) => {
        $graph.query($query)
    };
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::error::AppError;
    use crate::graph::query::QueryExt;
    use crate::graph::row::{Params, RowStream};
    use crate::graph::traits::QueryExecutor;

    #[derive(Default)]
    struct RecordingExecutor {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl QueryExecutor for RecordingExecutor {
        async fn execute_query(
            &self,
            j1ql: &str,
            _params: Params,
        ) -> Result<RowStream<'_>, AppError> {
            self.seen.lock().unwrap().push(j1ql.to_string());
            Ok(Box::pin(futures::stream::empty()))
        }
    }

    #[tokio::test]
    async fn test_j1ql_macro_runs_query_text() {
        let executor = RecordingExecutor::default();
        let query = format!("FIND DomainRecord WITH _scope != '{}'", "nslookup-shodan");

        let rows = j1ql!(executor, &query,).fetch_all().await.unwrap();

        assert!(rows.is_empty());
        assert_eq!(
            *executor.seen.lock().unwrap(),
            vec!["FIND DomainRecord WITH _scope != 'nslookup-shodan'".to_string()]
        );
    }
}
