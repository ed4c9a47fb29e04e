//! CLI for the redial resilience envelope.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use redial_core::config;

use commands::{run_probe, run_wait_db};

/// Top-level CLI for the redial smoke tool.
#[derive(Debug, Parser)]
#[command(name = "redial")]
#[command(about = "redial: resilient remote-call smoke tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Probe a URL with a HEAD request through the retry envelope.
    Probe {
        /// HTTP/HTTPS URL to probe.
        url: String,

        /// Override the configured maximum attempts.
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,
    },

    /// Wait until the configured database accepts connections (pool bootstrap).
    WaitDb {
        /// Override the configured DSN.
        #[arg(long)]
        dsn: Option<String>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Probe { url, max_attempts } => run_probe(&cfg, &url, max_attempts).await?,
            CliCommand::WaitDb { dsn } => run_wait_db(&cfg, dsn).await?,
        }

        Ok(())
    }
}
