//! TLS certificate retrieval.
//!
//! Connects to a host, completes a TLS handshake and reads the leaf
//! certificate the server presents. Chain validation is optional; with it
//! disabled any certificate is accepted so that expired or self-signed
//! certificates are still recorded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tokio::net::TcpStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{
    aws_lc_rs, verify_tls12_signature, verify_tls13_signature, CryptoProvider,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio_rustls::TlsConnector;
use x509_parser::prelude::{parse_x509_certificate, X509Name};

use crate::error::AppError;
use crate::models::CertificateInfo;

/// Fetches the certificate a host presents on a port.
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    async fn fetch(&self, hostname: &str, port: u16) -> Result<CertificateInfo, AppError>;
}

/// Connection settings for certificate lookups.
#[derive(Debug, Clone)]
pub struct CertificateOptions {
    /// Bound on connect plus handshake.
    pub timeout: Duration,
    /// Only `https:` is supported.
    pub scheme: String,
    /// Reject certificates that do not chain to a webpki root.
    pub validate: bool,
}

/// [`CertificateFetcher`] backed by rustls.
#[derive(Clone)]
pub struct TlsCertificateFetcher {
    connector: TlsConnector,
    options: CertificateOptions,
}

impl TlsCertificateFetcher {
    pub fn new(options: CertificateOptions) -> Result<Self, AppError> {
        let provider = Arc::new(aws_lc_rs::default_provider());
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| AppError::Internal(format!("invalid TLS configuration: {}", e)))?;

        let config = if options.validate {
            let roots = RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.into(),
            };
            builder.with_root_certificates(roots).with_no_client_auth()
        } else {
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
                .with_no_client_auth()
        };

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            options,
        })
    }
}

#[async_trait]
impl CertificateFetcher for TlsCertificateFetcher {
    async fn fetch(&self, hostname: &str, port: u16) -> Result<CertificateInfo, AppError> {
        let cert_error = |message: String| AppError::Certificate {
            host: hostname.to_string(),
            message,
        };

        let scheme = self.options.scheme.trim_end_matches(':');
        if !scheme.eq_ignore_ascii_case("https") {
            return Err(cert_error(format!("unsupported scheme '{}'", scheme)));
        }

        let server_name = ServerName::try_from(hostname.to_string())
            .map_err(|e| cert_error(format!("invalid server name: {}", e)))?;

        let handshake = async {
            let tcp = TcpStream::connect((hostname, port)).await?;
            self.connector.connect(server_name, tcp).await
        };
        let stream = tokio::time::timeout(self.options.timeout, handshake)
            .await
            .map_err(|_| cert_error(format!("timed out after {:?}", self.options.timeout)))?
            .map_err(|e| cert_error(e.to_string()))?;

        let (_, session) = stream.get_ref();
        let leaf = session
            .peer_certificates()
            .and_then(|chain| chain.first())
            .ok_or_else(|| cert_error("server presented no certificate".to_string()))?;

        parse_certificate(leaf.as_ref()).map_err(cert_error)
    }
}

/// Extracts report fields from a DER-encoded certificate.
pub fn parse_certificate(der: &[u8]) -> Result<CertificateInfo, String> {
    let (_, cert) = parse_x509_certificate(der).map_err(|e| e.to_string())?;
    let validity = cert.validity();

    Ok(CertificateInfo {
        subject: common_name(cert.subject()),
        issuer: common_name(cert.issuer()),
        fingerprint: fingerprint::<Sha1>(der),
        fingerprint256: fingerprint::<Sha256>(der),
        issued_on: to_utc(validity.not_before.timestamp())?,
        expires_on: to_utc(validity.not_after.timestamp())?,
    })
}

fn common_name(name: &X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

/// Uppercase colon-separated hex digest, e.g. `8A:DE:...`.
fn fingerprint<D: Digest>(der: &[u8]) -> String {
    D::digest(der)
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn to_utc(timestamp: i64) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| format!("certificate time out of range: {}", timestamp))
}

/// Verifier that accepts any chain but still checks handshake signatures.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, tokio_rustls::rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &[u8] = include_bytes!("../tests/fixtures/example_com.der");

    fn options(scheme: &str) -> CertificateOptions {
        CertificateOptions {
            timeout: Duration::from_secs(1),
            scheme: scheme.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_parse_certificate_fields() {
        let info = parse_certificate(FIXTURE).unwrap();

        assert_eq!(info.subject.as_deref(), Some("example.com"));
        assert_eq!(info.issuer.as_deref(), Some("example.com"));
        assert_eq!(
            info.fingerprint,
            "8A:DE:E8:50:7E:80:F8:9A:07:56:E0:D5:C1:1E:A0:9E:F3:09:09:B2"
        );
        assert_eq!(
            info.fingerprint256,
            "91:A4:C3:E9:26:2B:2A:EF:FF:B1:1E:74:67:9F:12:06:16:91:69:46:0A:7A:70:AB:5C:28:F0:23:24:8B:C1:D1"
        );
        assert_eq!(info.issued_on.timestamp(), 1_792_404_453);
        assert_eq!(info.expires_on.timestamp(), 1_823_940_453);
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_certificate(b"not a certificate").is_err());
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let fetcher = TlsCertificateFetcher::new(options("http:")).unwrap();
        let result = fetcher.fetch("example.com", 443).await;
        assert!(matches!(result, Err(AppError::Certificate { .. })));
    }

    #[tokio::test]
    async fn test_invalid_server_name() {
        let fetcher = TlsCertificateFetcher::new(options("https:")).unwrap();
        let result = fetcher.fetch("not a hostname", 443).await;
        assert!(matches!(result, Err(AppError::Certificate { .. })));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let fetcher = TlsCertificateFetcher::new(options("https:")).unwrap();
        let result = fetcher.fetch("localhost", port).await;
        assert!(matches!(result, Err(AppError::Certificate { host, .. }) if host == "localhost"));
    }

    #[test]
    fn test_validating_fetcher_builds() {
        let mut options = options("https");
        options.validate = true;
        assert!(TlsCertificateFetcher::new(options).is_ok());
    }
}
