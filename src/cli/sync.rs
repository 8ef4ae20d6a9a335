//! Sync command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::di::FromRef;
use crate::report::{render_skipped, SyncReport, REPORT_COUNTERS};
use crate::services::SyncService;

use super::App;

impl App {
    /// Run one sync: query, enrich, upload, report.
    pub async fn run_sync(&self, dry_run: bool) -> Result<()> {
        let config = Config::load_validated()?;
        tracing::debug!(config = ?config.redacted(), "Loaded configuration");

        let ctx = Context::from(config).await?;
        let service = SyncService::from_ref(&ctx);

        let run = service.collect().await?;

        if dry_run {
            let upload = run.to_upload(service.scope());
            println!("{}", serde_json::to_string_pretty(&upload)?);
            print!("{}", render_skipped(run.skipped()));
            return Ok(());
        }

        tracing::info!(
            entities = run.entities().len(),
            relationships = run.relationships().len(),
            "Uploading to JupiterOne"
        );
        let job = service.upload(&run).await?;
        tracing::info!(job_id = %job.id, status = %job.status, "Upload finished");

        print!("{}", SyncReport::from_job(&job, REPORT_COUNTERS));
        print!("{}", render_skipped(run.skipped()));

        Ok(())
    }
}
