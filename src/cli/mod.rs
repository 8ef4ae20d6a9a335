//! CLI module for hostsync.
//!
//! Subcommands:
//! - `sync`: Resolve, enrich and upload hosts for unlinked domain records
//! - `pending`: List the domain records the next sync would process

mod pending;
mod sync;

use clap::{Parser, Subcommand};

/// hostsync - discovered host enrichment for JupiterOne
#[derive(Parser)]
#[command(name = "hostsync")]
#[command(about = "Link DNS records to discovered hosts enriched with Shodan and TLS data")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Enrich unlinked domain records and upload the hosts
    Sync {
        /// Print the upload payload instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// List domain records without a discovered host
    Pending,
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Sync { dry_run } => self.run_sync(dry_run).await,
            Command::Pending => self.run_pending().await,
        }
    }
}
