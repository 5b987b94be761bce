//! Flag surface and logging setup for the `slack-advanced-exporter` binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use slack_exporter_core::{Credential, ExportConfig, ExportMode};

#[derive(Parser, Debug)]
#[command(
    name = "slack-advanced-exporter",
    version,
    about = "Enrich a Slack export archive with attachments or user e-mails"
)]
pub struct Cli {
    /// Slack export archive to read
    #[arg(short = 'i', long, global = true, value_name = "PATH")]
    pub input_archive: Option<PathBuf>,

    /// Archive to write the enriched export to
    #[arg(short = 'o', long, global = true, value_name = "PATH")]
    pub output_archive: Option<PathBuf>,

    /// Log progress to standard output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download attachments referenced by channel logs into __uploads/
    FetchAttachments {
        /// Slack API token, sent as a bearer token when given
        #[arg(long, value_name = "TOKEN")]
        api_token: Option<String>,
    },
    /// Fill users.json with e-mail addresses from users.list
    FetchEmails {
        /// Slack API token with the users:read.email scope
        #[arg(long, value_name = "TOKEN")]
        api_token: Option<String>,
    },
}

impl Cli {
    /// Turn parsed flags into the run configuration.
    ///
    /// A missing `--api-token` for `fetch-emails` is left for
    /// [`ExportConfig::validate`] to reject.
    pub fn into_config(self) -> anyhow::Result<ExportConfig> {
        let input = self
            .input_archive
            .context("required flag --input-archive not set")?;
        let output = self
            .output_archive
            .context("required flag --output-archive not set")?;

        let mode = match self.command {
            Command::FetchAttachments { api_token } => ExportMode::FetchAttachments {
                token: api_token.and_then(Credential::new),
            },
            Command::FetchEmails { api_token } => ExportMode::FetchEmails {
                token: api_token.and_then(Credential::new),
            },
        };

        Ok(ExportConfig::new(input, output, mode).with_verbose(self.verbose))
    }
}

/// Filter used when RUST_LOG is not set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "info"
    } else {
        "warn"
    }
}

/// Initialize tracing for the CLI. RUST_LOG takes precedence over `--verbose`.
pub fn init_tracing(verbose: bool) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive(verbose))),
        )
        .init();
}
