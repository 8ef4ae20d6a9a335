//! Backend implementations for graph stores.
//!
//! Each backend implements the core traits from [`crate::graph::traits`]:
//!
//! - [`QueryExecutor`](crate::graph::QueryExecutor) - Required
//! - [`BulkUploader`](crate::graph::BulkUploader) - Required
//!
//! # Available Backends
//!
//! | Backend | Module | Status |
//! |---------|--------|--------|
//! | JupiterOne | [`jupiterone`] | Available |

pub mod jupiterone;

pub use jupiterone::JupiterOneClient;
