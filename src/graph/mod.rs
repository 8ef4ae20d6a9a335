//! Graph store abstraction layer.
//!
//! The sync job talks to its graph through two capabilities:
//!
//! - [`QueryExecutor`] - Run J1QL and stream back every matching row
//! - [`BulkUploader`] - Push a batch of entities and relationships
//!
//! [`GraphClient`] combines both and is what the application context holds.
//! The only production backend is [`backends::JupiterOneClient`].
//!
//! # Usage
//!
//! ```ignore
//! use hostsync::graph::QueryExt;
//!
//! let rows = client.query("FIND DomainRecord").fetch_all().await?;
//! let job = client.bulk_upload(&upload).await?;
//! ```

mod macros;
mod query;
mod row;
mod traits;

pub mod backends;

// Re-export core types
pub use query::{Query, QueryExt};
pub use row::{Params, Row, RowStream};
pub use traits::{BulkUploader, GraphClient, QueryExecutor};

// Re-export macro (defined at crate root via #[macro_export])
#[doc(inline)]
pub use crate::j1ql;
