//! Forward DNS resolution of record values.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppError;

/// Resolves a hostname to a single address.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Returns one address for `hostname`.
    ///
    /// When several are available the implementation picks one.
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, AppError>;
}

/// Resolver backed by the operating system (`getaddrinfo`).
///
/// Returns the first address the system reports, like `dns.lookup`.
#[derive(Debug, Clone)]
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, AppError> {
        let resolve_error = |message: String| AppError::Resolve {
            host: hostname.to_string(),
            message,
        };

        if hostname.is_empty() {
            return Err(resolve_error("empty hostname".to_string()));
        }

        // Literal addresses need no lookup.
        if let Ok(address) = hostname.parse::<IpAddr>() {
            return Ok(address);
        }

        let lookup = tokio::net::lookup_host((hostname, 0));
        let mut addrs = tokio::time::timeout(self.timeout, lookup)
            .await
            .map_err(|_| resolve_error(format!("timed out after {:?}", self.timeout)))?
            .map_err(|e| resolve_error(e.to_string()))?;

        addrs
            .next()
            .map(|addr| addr.ip())
            .ok_or_else(|| resolve_error("no addresses returned".to_string()))
    }
}
