//! Shodan host intelligence lookups.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::ShodanConfig;
use crate::error::AppError;
use crate::models::HostIntel;

/// Looks up threat and location intelligence for an address.
#[async_trait]
pub trait HostIntelligence: Send + Sync {
    async fn lookup(&self, address: IpAddr) -> Result<HostIntel, AppError>;
}

/// Subset of the `/shodan/host/{ip}` response used for enrichment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShodanHost {
    #[serde(default)]
    pub hostnames: Vec<String>,
    #[serde(default)]
    pub ports: Vec<u16>,
    pub asn: Option<String>,
    pub isp: Option<String>,
    pub org: Option<String>,
    #[serde(default)]
    pub domains: Vec<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub city: Option<String>,
    pub country_name: Option<String>,
    pub country_code: Option<String>,
    pub region_code: Option<String>,
    pub postal_code: Option<String>,
    pub dma_code: Option<i64>,
    pub os: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<ShodanHost> for HostIntel {
    fn from(host: ShodanHost) -> Self {
        Self {
            hostnames: host.hostnames,
            ports: host.ports,
            asn: host.asn,
            isp: host.isp,
            org: host.org,
            domains: host.domains,
            longitude: host.longitude,
            latitude: host.latitude,
            city: host.city,
            country: host.country_name,
            country_code: host.country_code,
            region_code: host.region_code,
            postal_code: host.postal_code,
            dma_code: host.dma_code,
            os: host.os,
            tags: host.tags,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ShodanErrorBody {
    error: String,
}

/// HTTP client for the Shodan REST API.
#[derive(Clone)]
pub struct ShodanClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ShodanClient {
    pub fn new(config: &ShodanConfig, timeout: Duration) -> Result<Self, AppError> {
        if config.token.trim().is_empty() {
            return Err(AppError::MissingCredential("SHODAN_TOKEN"));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn host_url(&self, address: IpAddr) -> String {
        format!("{}/shodan/host/{}", self.base_url, address)
    }
}

#[async_trait]
impl HostIntelligence for ShodanClient {
    async fn lookup(&self, address: IpAddr) -> Result<HostIntel, AppError> {
        let response = self
            .http
            .get(self.host_url(address))
            .query(&[("key", self.token.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, address));
        }

        let host: ShodanHost = response.json().await?;
        Ok(host.into())
    }
}

fn status_error(status: StatusCode, body: &str, address: IpAddr) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized {
            service: "Shodan",
            status: status.as_u16(),
        },
        StatusCode::NOT_FOUND => AppError::NoIntel(address.to_string()),
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited,
        _ => AppError::Intel {
            status: status.as_u16(),
            message: serde_json::from_str::<ShodanErrorBody>(body)
                .map(|e| e.error)
                .unwrap_or_else(|_| body.trim().to_string()),
        },
    }
}
