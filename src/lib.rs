//! hostsync - discovered host enrichment for a JupiterOne graph
//!
//! Finds DNS records with no linked host, resolves them, enriches each
//! address with Shodan data and TLS certificate details, and uploads the
//! hosts and edges back to the graph.

pub mod certificate;
pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod error;
pub mod graph;
pub mod models;
pub mod repositories;
pub mod report;
pub mod resolver;
pub mod services;
pub mod shodan;

#[cfg(test)]
mod testing;

// Re-export FromRef at crate root
pub use di::FromRef;
