//! Domain models for the host enrichment graph.

mod domain_record;
mod host;
mod relationship;
mod sync_job;

pub use domain_record::DomainRecord;
pub use host::{host_key, CertificateInfo, HostEntity, HostIntel, ResolvedHost, HTTPS_PORT};
pub use relationship::{edge_key, ConnectionEdge};
pub use sync_job::{BulkUpload, SyncJob};
