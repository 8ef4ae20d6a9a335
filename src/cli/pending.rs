//! Pending command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::context::Context;
use crate::di::FromRef;
use crate::services::SyncService;

use super::App;

impl App {
    /// Print the domain records the next sync would process.
    pub async fn run_pending(&self) -> Result<()> {
        let config = Config::load_validated()?;
        let ctx = Context::from(config).await?;
        let service = SyncService::from_ref(&ctx);

        let records = service.pending_records().await?;
        for record in &records {
            println!(
                "{}\t{}\t{}",
                record.key,
                record.record_type.as_deref().unwrap_or("-"),
                record.hostname().unwrap_or("-")
            );
        }
        tracing::info!(count = records.len(), scope = %service.scope(), "Pending domain records");

        Ok(())
    }
}
