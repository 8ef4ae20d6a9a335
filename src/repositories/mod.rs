//! Data access layer for graph operations.
//!
//! Repositories wrap the graph client behind domain-level methods and are
//! resolved from the application context via `FromRef`.

mod domain_record;

pub use domain_record::{unlinked_records_query, DomainRecordRepository};
