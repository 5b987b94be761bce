//! slack-advanced-exporter: post-processes a Slack export archive.
//!
//! Set SLACK_API_URL to point users.list at another host. A `.env` file in
//! the working directory is loaded first.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use slack_exporter_api_client::SlackClient;
use slack_exporter_cli::{init_tracing, Cli};
use slack_exporter_services::run_export;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Cli::parse().into_config()?;
    init_tracing(config.verbose);

    config.validate().context("Invalid arguments")?;

    let client =
        SlackClient::new(config.api_base_url.as_str()).context("Failed to build HTTP client")?;

    let report = run_export(&config, Arc::new(client))
        .await
        .with_context(|| {
            format!(
                "{} failed for {}",
                config.mode.name(),
                config.input_archive.display()
            )
        })?;

    tracing::info!(output = %config.output_archive.display(), "Export written");
    println!("{}", report);

    Ok(())
}
