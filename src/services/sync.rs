//! Host enrichment pipeline: resolve → enrich → certificate → link → upload.

use std::net::IpAddr;
use std::sync::Arc;

use crate::config::Config;
use crate::context::{AppCertificates, AppIntel, AppResolver, Context};
use crate::di::FromRef;
use crate::error::AppError;
use crate::models::{host_key, DomainRecord, HostEntity, ResolvedHost, SyncJob};
use crate::repositories::DomainRecordRepository;
use crate::services::run::{RecordOutcome, StepOutcome, SyncRun};

/// Outcome of a complete run.
#[derive(Debug)]
pub struct SyncSummary {
    pub run: SyncRun,
    /// The finalized upload job.
    pub job: SyncJob,
}

/// Service that links unsynced domain records to enriched hosts.
///
/// Records are processed one at a time. Each distinct address is enriched
/// once; later records resolving to the same address only add an edge.
#[derive(Clone)]
pub struct SyncService {
    records: DomainRecordRepository,
    resolver: AppResolver,
    intel: AppIntel,
    certificates: AppCertificates,
    config: Arc<Config>,
}

impl FromRef<Context> for SyncService {
    fn from_ref(ctx: &Context) -> Self {
        Self {
            records: DomainRecordRepository::from_ref(ctx),
            resolver: AppResolver::from_ref(ctx),
            intel: AppIntel::from_ref(ctx),
            certificates: AppCertificates::from_ref(ctx),
            config: Arc::<Config>::from_ref(ctx),
        }
    }
}

impl SyncService {
    /// Scope label used for the query filter and the upload.
    pub fn scope(&self) -> &str {
        &self.config.sync.scope
    }

    /// Domain records not yet linked to a host under this scope.
    pub async fn pending_records(&self) -> Result<Vec<DomainRecord>, AppError> {
        self.records.find_unlinked(self.scope()).await
    }

    /// Runs the whole pipeline and uploads the result.
    pub async fn run(&self) -> Result<SyncSummary, AppError> {
        let run = self.collect().await?;
        let job = self.upload(&run).await?;
        Ok(SyncSummary { run, job })
    }

    /// Processes every pending record without uploading.
    pub async fn collect(&self) -> Result<SyncRun, AppError> {
        let records = self.pending_records().await?;
        let mut run = SyncRun::new();

        for record in &records {
            self.process_record(&mut run, record).await;
        }

        tracing::info!(
            records = records.len(),
            hosts = run.entities().len(),
            relationships = run.relationships().len(),
            skipped = run.skipped().len(),
            "Processed domain records"
        );
        Ok(run)
    }

    /// Uploads the hosts and edges collected by `run`.
    pub async fn upload(&self, run: &SyncRun) -> Result<SyncJob, AppError> {
        let upload = run.to_upload(self.scope());
        self.records.upload(&upload).await.inspect_err(|e| {
            tracing::error!(error = %e, "Bulk upload failed");
            if !run.skipped().is_empty() {
                tracing::error!(skipped = ?run.skipped(), "Hostnames skipped before the failed upload");
            }
        })
    }

    /// Drives one record to a terminal state.
    ///
    /// Never fails: resolution errors put the hostname on the skip list and
    /// enrichment errors leave the host with partial fields.
    pub async fn process_record(&self, run: &mut SyncRun, record: &DomainRecord) -> RecordOutcome {
        let Some(hostname) = record.hostname() else {
            tracing::debug!(key = %record.key, "DomainRecord has no value, ignoring");
            return RecordOutcome::Ignored;
        };

        let resolved = match self.resolve(hostname).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::error!(host = %hostname, error = %e, "Could not resolve host, skipping");
                run.skip(hostname);
                return RecordOutcome::Skipped {
                    hostname: hostname.to_string(),
                    reason: e.to_string(),
                };
            }
        };
        let address = resolved.address;

        tracing::info!(
            entity_id = %record.id,
            entity_key = %record.key,
            host = %resolved.hostname,
            address = %address,
            "Working on DomainRecord"
        );

        let (new_host, intel, certificate) = if run.contains(address) {
            (false, StepOutcome::Skipped, StepOutcome::Skipped)
        } else {
            let (host, intel, certificate) = self.discover_host(record, resolved).await;
            run.insert_host(host);
            (true, intel, certificate)
        };

        run.link(record, address);

        RecordOutcome::Linked {
            host_key: host_key(&address),
            new_host,
            intel,
            certificate,
        }
    }

    async fn resolve<'h>(&self, hostname: &'h str) -> Result<ResolvedHost<'h>, AppError> {
        let address = self.resolver.resolve(hostname).await?;
        Ok(ResolvedHost { hostname, address })
    }

    /// Builds a new host for a first-seen address.
    async fn discover_host(
        &self,
        record: &DomainRecord,
        resolved: ResolvedHost<'_>,
    ) -> (HostEntity, StepOutcome, StepOutcome) {
        tracing::debug!(host = %resolved.hostname, address = %resolved.address, "Discovered new host");
        let mut host = HostEntity::new(resolved.address);
        let intel = self.enrich(&mut host, resolved.address).await;
        let certificate = self.attach_certificate(&mut host, record).await;
        (host, intel, certificate)
    }

    async fn enrich(&self, host: &mut HostEntity, address: IpAddr) -> StepOutcome {
        match self.intel.lookup(address).await {
            Ok(intel) => {
                tracing::debug!(address = %address, ports = ?intel.ports, "Enriched host");
                host.intel = Some(intel);
                StepOutcome::Complete
            }
            Err(e) => {
                tracing::error!(address = %address, error = %e, "Host enrichment failed");
                StepOutcome::Partial(e.to_string())
            }
        }
    }

    async fn attach_certificate(&self, host: &mut HostEntity, record: &DomainRecord) -> StepOutcome {
        let port = self.config.sync.cert_port;
        if !host.has_open_port(port) {
            return StepOutcome::Skipped;
        }
        let Some(cert_host) = record.certificate_host() else {
            return StepOutcome::Skipped;
        };

        match self.certificates.fetch(cert_host, port).await {
            Ok(certificate) => {
                tracing::debug!(host = %cert_host, subject = ?certificate.subject, "Fetched certificate");
                host.certificate = Some(certificate);
                StepOutcome::Complete
            }
            Err(e) => {
                tracing::error!(host = %cert_host, error = %e, "Certificate fetch failed");
                StepOutcome::Partial(e.to_string())
            }
        }
    }
}
