//! Wires one pipeline run from parsed CLI arguments.

use std::time::Duration;

use anyhow::{Context, Result};
use fhirtab_ingest::BundleReader;
use fhirtab_model::ModelRegistry;
use fhirtab_pipeline::{
    create_pool, run_pipeline, DbConfig, PipelineOptions, PipelineReport, PostgresSink,
};

use crate::Cli;

/// Build the stages against the configured database and run them to
/// completion. Stage failures are reported through the returned
/// [`PipelineReport`]; only setup and task panics surface as `Err`.
pub async fn execute(cli: &Cli) -> Result<PipelineReport> {
    let db_config = DbConfig::from_env().context("reading database configuration")?;
    let pool = create_pool(&db_config)
        .await
        .context("connecting to the destination database")?;

    let reader = BundleReader::with_timeout(Duration::from_secs(cli.http_timeout_secs))
        .context("building the HTTP client")?;
    let registry = ModelRegistry::with_defaults();
    let sink = PostgresSink::new(pool.clone());
    let options = PipelineOptions::with_capacity(cli.queue_capacity);

    let report = run_pipeline(reader, cli.command.source(), registry, sink, options).await;

    pool.close().await;
    report
}
