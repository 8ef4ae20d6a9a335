//! Discovered host entities and their enrichment sections.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Port whose presence triggers a certificate lookup by default.
pub const HTTPS_PORT: u16 = 443;

const HOST_TYPE: &str = "discovered_host";
const HOST_CLASS: &str = "Host";

/// Returns the entity key for an address: `discovered_host:<address>`.
pub fn host_key(address: &IpAddr) -> String {
    format!("{}:{}", HOST_TYPE, address)
}

/// A hostname paired with the address it resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedHost<'a> {
    pub hostname: &'a str,
    pub address: IpAddr,
}

/// A unique network address discovered through DNS.
///
/// The graph fields are always present. `intel` and `certificate` are
/// only set when the corresponding lookup succeeded; their properties are
/// flattened into the entity on upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostEntity {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub entity_type: &'static str,
    #[serde(rename = "_class")]
    pub class: &'static str,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "publicIpAddress")]
    pub public_ip_address: IpAddr,
    #[serde(flatten)]
    pub intel: Option<HostIntel>,
    #[serde(flatten)]
    pub certificate: Option<CertificateInfo>,
}

impl HostEntity {
    /// Creates a bare host carrying only its address-derived fields.
    pub fn new(address: IpAddr) -> Self {
        Self {
            key: host_key(&address),
            entity_type: HOST_TYPE,
            class: HOST_CLASS,
            display_name: address.to_string(),
            public_ip_address: address,
            intel: None,
            certificate: None,
        }
    }

    pub fn address(&self) -> IpAddr {
        self.public_ip_address
    }

    /// Whether enrichment reported `port` open.
    pub fn has_open_port(&self, port: u16) -> bool {
        self.intel
            .as_ref()
            .is_some_and(|intel| intel.ports.contains(&port))
    }
}

/// Threat-intelligence fields reported for an address.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HostIntel {
    #[serde(rename = "hostname")]
    pub hostnames: Vec<String>,
    pub ports: Vec<u16>,
    #[serde(rename = "ASN", skip_serializing_if = "Option::is_none")]
    pub asn: Option<String>,
    #[serde(rename = "ISP", skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(rename = "domain")]
    pub domains: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "countryCode", skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(rename = "regionCode", skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
    #[serde(rename = "postalCode", skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(rename = "dmaCode", skip_serializing_if = "Option::is_none")]
    pub dma_code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    pub tags: Vec<String>,
}

/// Leaf certificate presented by a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateInfo {
    /// Subject common name.
    #[serde(rename = "certSubject")]
    pub subject: Option<String>,
    /// Issuer common name.
    #[serde(rename = "certIssuer")]
    pub issuer: Option<String>,
    /// SHA-1 digest of the DER encoding, `AA:BB:...`.
    #[serde(rename = "certFingerprint")]
    pub fingerprint: String,
    /// SHA-256 digest of the DER encoding, `AA:BB:...`.
    #[serde(rename = "certFingerprint256")]
    pub fingerprint256: String,
    #[serde(rename = "certIssuedOn", with = "chrono::serde::ts_milliseconds")]
    pub issued_on: DateTime<Utc>,
    #[serde(rename = "certExpiresOn", with = "chrono::serde::ts_milliseconds")]
    pub expires_on: DateTime<Utc>,
}
