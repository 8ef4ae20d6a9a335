//! JupiterOne backend implementation.
//!
//! Queries go through the GraphQL `queryV1` field; writes use the
//! synchronization job REST API (start, upload, finalize).
//!
//! # Example
//!
//! ```ignore
//! use hostsync::graph::backends::JupiterOneClient;
//! use hostsync::graph::QueryExt;
//!
//! let client = JupiterOneClient::connect(&config.jupiterone).await?;
//! let rows = client.query("FIND DomainRecord").fetch_all().await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::config::JupiterOneConfig;
use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::{BulkUploader, QueryExecutor};
use crate::models::{BulkUpload, SyncJob};

const SERVICE: &str = "JupiterOne";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum graph objects per upload request.
pub const UPLOAD_BATCH_SIZE: usize = 250;

/// Cheap query used to check credentials at startup.
const VERIFY_QUERY: &str = "FIND DomainRecord LIMIT 1";

const QUERY_V1: &str = r#"
query J1QL(
  $query: String!
  $variables: JSON
  $cursor: String
  $deferredResponse: DeferredResponseOption
) {
  queryV1(
    query: $query
    variables: $variables
    cursor: $cursor
    deferredResponse: $deferredResponse
  ) {
    type
    data
    cursor
  }
}
"#;

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'static str,
    variables: QueryV1Variables<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryV1Variables<'a> {
    query: &'a str,
    variables: &'a Params,
    cursor: Option<&'a str>,
    deferred_response: &'static str,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryV1Data {
    query_v1: QueryPage,
}

#[derive(Deserialize)]
struct QueryPage {
    #[serde(default)]
    data: JsonValue,
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct JobEnvelope {
    job: SyncJob,
}

/// JupiterOne graph client.
///
/// This type is cheap to clone - the HTTP connection pool is `Arc`-based.
#[derive(Clone)]
pub struct JupiterOneClient {
    http: reqwest::Client,
    account: Arc<str>,
    api_token: Arc<str>,
    graphql_url: Arc<str>,
    api_base_url: Arc<str>,
}

impl JupiterOneClient {
    /// Creates a client without contacting the service.
    pub fn new(config: &JupiterOneConfig) -> Result<Self, AppError> {
        if config.account.trim().is_empty() {
            return Err(AppError::MissingCredential("J1_ACCOUNT_ID"));
        }
        if config.api_token.trim().is_empty() {
            return Err(AppError::MissingCredential("J1_API_TOKEN"));
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            account: Arc::from(config.account.as_str()),
            api_token: Arc::from(config.api_token.as_str()),
            graphql_url: Arc::from(config.graphql_url.as_str()),
            api_base_url: Arc::from(config.api_base_url.trim_end_matches('/')),
        })
    }

    /// Creates a client and verifies the credentials with a one-row query.
    pub async fn connect(config: &JupiterOneConfig) -> Result<Self, AppError> {
        let client = Self::new(config)?;
        client.verify().await?;
        Ok(client)
    }

    /// Returns the account this client acts on.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Runs a one-row query, failing if the service rejects the token.
    pub async fn verify(&self) -> Result<(), AppError> {
        self.query_page(VERIFY_QUERY, &Params::new(), None).await?;
        Ok(())
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .bearer_auth(self.api_token.as_ref())
            .header("JupiterOne-Account", self.account.as_ref())
    }

    async fn query_page(
        &self,
        j1ql: &str,
        params: &Params,
        cursor: Option<&str>,
    ) -> Result<(Vec<JsonValue>, Option<String>), AppError> {
        let query_error = |message: String| AppError::Query {
            message,
            query: j1ql.to_string(),
        };

        let body = GraphQlRequest {
            query: QUERY_V1,
            variables: QueryV1Variables {
                query: j1ql,
                variables: params,
                cursor,
                deferred_response: "DISABLED",
            },
        };
        let response = self.request(&self.graphql_url).json(&body).send().await?;
        let response: GraphQlResponse<QueryV1Data> = read_json(response, query_error).await?;

        if let Some(error) = response.errors.first() {
            return Err(query_error(error.message.clone()));
        }
        let page = response
            .data
            .ok_or_else(|| query_error("response contained no data".to_string()))?
            .query_v1;

        let items = match page.data {
            JsonValue::Array(items) => items,
            JsonValue::Null => Vec::new(),
            other => {
                return Err(query_error(format!(
                    "unsupported result shape: {}",
                    json_kind(&other)
                )))
            }
        };
        Ok((items, page.cursor.filter(|c| !c.is_empty())))
    }

    async fn post_job<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        stage: &'static str,
    ) -> Result<SyncJob, AppError> {
        let url = format!("{}/persister/synchronization/jobs{}", self.api_base_url, path);
        let response = self.request(&url).json(body).send().await?;
        let envelope: JobEnvelope = read_json(response, |message| AppError::Upload {
            stage,
            message,
        })
        .await?;
        Ok(envelope.job)
    }

    async fn upload_objects(&self, upload: &BulkUpload, job_id: &str) -> Result<(), AppError> {
        let path = format!("/{}/upload", job_id);
        for chunk in upload.entities.chunks(UPLOAD_BATCH_SIZE) {
            self.post_job(&path, &json!({ "entities": chunk }), "upload")
                .await?;
            tracing::debug!(job_id, count = chunk.len(), "Uploaded entity batch");
        }
        for chunk in upload.relationships.chunks(UPLOAD_BATCH_SIZE) {
            self.post_job(&path, &json!({ "relationships": chunk }), "upload")
                .await?;
            tracing::debug!(job_id, count = chunk.len(), "Uploaded relationship batch");
        }
        Ok(())
    }
}

#[async_trait]
impl QueryExecutor for JupiterOneClient {
    async fn execute_query(&self, j1ql: &str, params: Params) -> Result<RowStream<'_>, AppError> {
        let j1ql: Arc<str> = Arc::from(j1ql);
        let params = Arc::new(params);

        // State is the cursor for the next page; `None` once the last page is read.
        let pages = futures::stream::try_unfold(Some(None::<String>), move |state| {
            let j1ql = j1ql.clone();
            let params = params.clone();
            async move {
                let Some(cursor) = state else {
                    return Ok::<_, AppError>(None);
                };
                let (items, next) = self.query_page(&j1ql, &params, cursor.as_deref()).await?;
                tracing::debug!(rows = items.len(), more = next.is_some(), "Fetched query page");
                Ok(Some((items, next.map(Some))))
            }
        });

        let rows = pages
            .map_ok(|items| futures::stream::iter(items.into_iter().map(Row::try_from)))
            .try_flatten();
        Ok(rows.boxed())
    }
}

#[async_trait]
impl BulkUploader for JupiterOneClient {
    async fn bulk_upload(&self, upload: &BulkUpload) -> Result<SyncJob, AppError> {
        let job = self
            .post_job("", &json!({ "source": "api", "scope": upload.scope }), "start")
            .await?;
        tracing::info!(job_id = %job.id, scope = %upload.scope, "Started synchronization job");

        if let Err(e) = self.upload_objects(upload, &job.id).await {
            let abort = self
                .post_job(
                    &format!("/{}/abort", job.id),
                    &json!({ "reason": e.to_string() }),
                    "abort",
                )
                .await;
            if let Err(abort_err) = abort {
                tracing::warn!(job_id = %job.id, error = %abort_err, "Failed to abort synchronization job");
            }
            return Err(e);
        }

        let job = self
            .post_job(&format!("/{}/finalize", job.id), &json!({}), "finalize")
            .await?;
        tracing::info!(job_id = %job.id, status = %job.status, "Finalized synchronization job");
        Ok(job)
    }
}

/// Decodes a JSON body, mapping error statuses to [`AppError`].
async fn read_json<T, F>(response: reqwest::Response, on_error: F) -> Result<T, AppError>
where
    T: DeserializeOwned,
    F: FnOnce(String) -> AppError,
{
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AppError::Unauthorized {
            service: SERVICE,
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(on_error(format!("HTTP {}: {}", status.as_u16(), body.trim())));
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| on_error(format!("invalid response body: {}", e)))
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;
    use crate::graph::QueryExt;
    use crate::models::{ConnectionEdge, DomainRecord, HostEntity};
    use crate::testing::StubServer;

    fn config() -> JupiterOneConfig {
        JupiterOneConfig {
            account: "j1dev".to_string(),
            api_token: "token".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_requires_account() {
        let mut config = config();
        config.account = String::new();
        assert!(matches!(
            JupiterOneClient::new(&config),
            Err(AppError::MissingCredential("J1_ACCOUNT_ID"))
        ));
    }

    #[test]
    fn test_new_requires_token() {
        let mut config = config();
        config.api_token = " ".to_string();
        assert!(matches!(
            JupiterOneClient::new(&config),
            Err(AppError::MissingCredential("J1_API_TOKEN"))
        ));
    }

    #[test]
    fn test_new_trims_base_url() {
        let mut config = config();
        config.api_base_url = "https://api.example.test/".to_string();
        let client = JupiterOneClient::new(&config).unwrap();
        assert_eq!(client.api_base_url.as_ref(), "https://api.example.test");
        assert_eq!(client.account(), "j1dev");
    }

    #[test]
    fn test_query_variables_shape() {
        let params = Params::new();
        let body = GraphQlRequest {
            query: QUERY_V1,
            variables: QueryV1Variables {
                query: "FIND DomainRecord",
                variables: &params,
                cursor: None,
                deferred_response: "DISABLED",
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["variables"]["query"], "FIND DomainRecord");
        assert_eq!(value["variables"]["deferredResponse"], "DISABLED");
        assert!(value["variables"]["cursor"].is_null());
    }

    #[test]
    fn test_query_page_response_decodes() {
        let response: GraphQlResponse<QueryV1Data> = serde_json::from_value(json!({
            "data": {
                "queryV1": {
                    "type": "list",
                    "data": [{"entity": {"_id": "a", "_key": "dr1"}, "properties": {}}],
                    "cursor": "next-page"
                }
            }
        }))
        .unwrap();

        let page = response.data.unwrap().query_v1;
        assert_eq!(page.cursor.as_deref(), Some("next-page"));
        assert_eq!(page.data.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_graphql_errors_decode() {
        let response: GraphQlResponse<QueryV1Data> = serde_json::from_value(json!({
            "data": null,
            "errors": [{"message": "Error parsing query"}]
        }))
        .unwrap();
        assert!(response.data.is_none());
        assert_eq!(response.errors[0].message, "Error parsing query");
    }

    fn stub_config(server: &StubServer) -> JupiterOneConfig {
        JupiterOneConfig {
            api_base_url: server.url(""),
            graphql_url: server.url("/graphql"),
            ..config()
        }
    }

    fn page(items: JsonValue, cursor: JsonValue) -> (u16, JsonValue) {
        (
            200,
            json!({"data": {"queryV1": {"type": "list", "data": items, "cursor": cursor}}}),
        )
    }

    fn record(id: &str, key: &str) -> JsonValue {
        json!({"entity": {"_id": id, "_key": key}, "properties": {"value": "example.com"}})
    }

    fn job(status: &str) -> (u16, JsonValue) {
        (200, json!({"job": {"id": "job-1", "status": status}}))
    }

    fn upload_with(entities: u32) -> BulkUpload {
        let hosts: Vec<HostEntity> = (0..entities)
            .map(|i| HostEntity::new(IpAddr::V4(Ipv4Addr::from(0x0a00_0000 + i))))
            .collect();
        let record = DomainRecord::new("id-1", "dr1", "example.com");
        let relationships = vec![ConnectionEdge::connect(&record, &hosts[0])];
        BulkUpload {
            scope: "nslookup-shodan".to_string(),
            entities: hosts,
            relationships,
        }
    }

    #[tokio::test]
    async fn test_execute_query_follows_cursor() {
        let server = StubServer::start(|request| {
            match request.body["variables"]["cursor"].as_str() {
                None => page(json!([record("a", "dr1")]), json!("page-2")),
                Some("page-2") => page(json!([record("b", "dr2")]), JsonValue::Null),
                Some(_) => (400, json!({"errors": [{"message": "bad cursor"}]})),
            }
        })
        .await;
        let client = JupiterOneClient::new(&stub_config(&server)).unwrap();

        let rows = client.query("FIND DomainRecord").fetch_all().await.unwrap();

        let keys: Vec<String> = rows
            .iter()
            .map(|row| row.get_path(&["entity", "_key"]).unwrap())
            .collect();
        assert_eq!(keys, vec!["dr1", "dr2"]);

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/graphql");
        assert_eq!(requests[0].header("authorization"), Some("Bearer token"));
        assert_eq!(requests[0].header("jupiterone-account"), Some("j1dev"));
        assert_eq!(requests[0].body["variables"]["query"], "FIND DomainRecord");
        assert_eq!(requests[0].body["variables"]["deferredResponse"], "DISABLED");
        assert!(requests[0].body["variables"]["cursor"].is_null());
        assert_eq!(requests[1].body["variables"]["cursor"], "page-2");
    }

    #[tokio::test]
    async fn test_execute_query_stops_on_empty_cursor() {
        let server =
            StubServer::start(|_| page(json!([record("a", "dr1"), record("b", "dr2")]), json!("")))
                .await;
        let client = JupiterOneClient::new(&stub_config(&server)).unwrap();

        let rows = client.query("FIND DomainRecord").fetch_all().await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_query_reports_graphql_error() {
        let server =
            StubServer::start(|_| (200, json!({"data": null, "errors": [{"message": "Error parsing query"}]})))
                .await;
        let client = JupiterOneClient::new(&stub_config(&server)).unwrap();

        match client.query("FIND nothing").fetch_all().await {
            Err(AppError::Query { message, query }) => {
                assert_eq!(message, "Error parsing query");
                assert_eq!(query, "FIND nothing");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_rejects_unauthorized_token() {
        let server = StubServer::start(|_| (401, json!({"error": "Unauthorized"}))).await;

        let result = JupiterOneClient::connect(&stub_config(&server)).await;

        assert!(matches!(
            result,
            Err(AppError::Unauthorized {
                service: "JupiterOne",
                status: 401
            })
        ));
        assert_eq!(server.requests()[0].body["variables"]["query"], VERIFY_QUERY);
    }

    #[tokio::test]
    async fn test_bulk_upload_batches_and_finalizes() {
        let server = StubServer::start(|request| {
            if request.path.ends_with("/finalize") {
                (
                    200,
                    json!({"job": {"id": "job-1", "status": "FINISHED", "numEntitiesUploaded": 251}}),
                )
            } else {
                job("AWAITING_UPLOADS")
            }
        })
        .await;
        let client = JupiterOneClient::new(&stub_config(&server)).unwrap();

        let finished = client.bulk_upload(&upload_with(251)).await.unwrap();

        assert_eq!(finished.status, "FINISHED");
        assert_eq!(finished.counter("numEntitiesUploaded"), Some(251));
        assert_eq!(
            server.paths(),
            vec![
                "/persister/synchronization/jobs",
                "/persister/synchronization/jobs/job-1/upload",
                "/persister/synchronization/jobs/job-1/upload",
                "/persister/synchronization/jobs/job-1/upload",
                "/persister/synchronization/jobs/job-1/finalize",
            ]
        );

        let requests = server.requests();
        assert_eq!(
            requests[0].body,
            json!({"source": "api", "scope": "nslookup-shodan"})
        );
        let batch_len = |i: usize, field: &str| requests[i].body[field].as_array().map(Vec::len);
        assert_eq!(batch_len(1, "entities"), Some(UPLOAD_BATCH_SIZE));
        assert_eq!(batch_len(2, "entities"), Some(1));
        assert_eq!(batch_len(3, "relationships"), Some(1));
        assert_eq!(
            requests[3].body["relationships"][0]["_key"],
            "dr1|connects|discovered_host:10.0.0.0"
        );
    }

    #[tokio::test]
    async fn test_bulk_upload_aborts_on_failed_batch() {
        let server = StubServer::start(|request| {
            if request.path.ends_with("/upload") {
                (500, json!({"error": "persister unavailable"}))
            } else {
                job("ABORTED")
            }
        })
        .await;
        let client = JupiterOneClient::new(&stub_config(&server)).unwrap();

        let result = client.bulk_upload(&upload_with(3)).await;

        match result {
            Err(AppError::Upload { stage, message }) => {
                assert_eq!(stage, "upload");
                assert!(message.starts_with("HTTP 500"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(
            server.paths(),
            vec![
                "/persister/synchronization/jobs",
                "/persister/synchronization/jobs/job-1/upload",
                "/persister/synchronization/jobs/job-1/abort",
            ]
        );
        let abort = &server.requests()[2];
        assert!(abort.body["reason"]
            .as_str()
            .is_some_and(|reason| reason.contains("HTTP 500")));
    }
}
