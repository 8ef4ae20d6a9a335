//! Application context providing dependency injection root.

use std::sync::Arc;
use std::time::Duration;

use crate::certificate::{CertificateFetcher, CertificateOptions, TlsCertificateFetcher};
use crate::config::Config;
use crate::error::AppError;
use crate::graph::backends::JupiterOneClient;
use crate::graph::GraphClient;
use crate::provide_fields;
use crate::resolver::{HostResolver, SystemResolver};
use crate::shodan::{HostIntelligence, ShodanClient};

/// Graph store (queries and bulk upload).
pub type AppGraph = Arc<dyn GraphClient>;
/// DNS resolver.
pub type AppResolver = Arc<dyn HostResolver>;
/// Threat-intelligence source.
pub type AppIntel = Arc<dyn HostIntelligence>;
/// TLS certificate source.
pub type AppCertificates = Arc<dyn CertificateFetcher>;

/// Root application context for dependency injection.
///
/// Holds every external collaborator behind a trait object so tests can
/// swap in doubles. Each field is extractable via `FromRef`.
#[derive(Clone)]
pub struct Context {
    pub graph: AppGraph,
    pub resolver: AppResolver,
    pub intel: AppIntel,
    pub certificates: AppCertificates,
    pub config: Arc<Config>,
}

provide_fields!(Context {
    graph: AppGraph,
    resolver: AppResolver,
    intel: AppIntel,
    certificates: AppCertificates,
    config: Arc<Config>,
});

impl Context {
    /// Creates a context from already-built collaborators.
    pub fn new(
        graph: AppGraph,
        resolver: AppResolver,
        intel: AppIntel,
        certificates: AppCertificates,
        config: Config,
    ) -> Self {
        Self {
            graph,
            resolver,
            intel,
            certificates,
            config: Arc::new(config),
        }
    }

    /// Builds the production collaborators from configuration.
    ///
    /// Fails if any credential is missing or the graph service rejects the
    /// API token.
    pub async fn from(config: Config) -> Result<Self, AppError> {
        config.validate()?;

        tracing::info!(
            account = %config.jupiterone.account,
            "Authenticating with JupiterOne"
        );
        let graph = JupiterOneClient::connect(&config.jupiterone).await?;
        tracing::info!("Authenticated with JupiterOne");

        let http_timeout = Duration::from_millis(config.sync.http_timeout_ms);
        let intel = ShodanClient::new(&config.shodan, http_timeout)?;
        let resolver = SystemResolver::new(Duration::from_millis(config.sync.lookup_timeout_ms));
        let certificates = TlsCertificateFetcher::new(CertificateOptions {
            timeout: http_timeout,
            scheme: config.sync.cert_scheme.clone(),
            validate: config.sync.validate_certificates,
        })?;

        Ok(Self::new(
            Arc::new(graph),
            Arc::new(resolver),
            Arc::new(intel),
            Arc::new(certificates),
            config,
        ))
    }
}
