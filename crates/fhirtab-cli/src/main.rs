//! Fhirtab CLI - Main entry point

use clap::Parser;
use fhirtab_cli::{execute, Cli};
use fhirtab_common::logging::init_logging;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Environment base with the explicit flags on top
    let log_config = match cli.log_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        }
    };

    // The guard must stay alive until exit so file output is flushed
    let _guard = init_logging(&log_config).unwrap_or(None);

    // Run the pipeline
    let result = execute(&cli).await;

    // Handle result
    match result {
        Ok(report) => {
            if !report.success() {
                if let Err(e) = &report.ingest {
                    eprintln!("Error: ingest failed: {e}");
                }
                if let Err(e) = &report.transform {
                    eprintln!("Error: transform failed: {e}");
                }
                if !report.load.all_loaded() {
                    eprintln!(
                        "Error: {} of {} batches could not be stored",
                        report.load.failed_batches, report.load.batches
                    );
                }
                process::exit(1);
            }
        }
        Err(e) => {
            error!(error = %e, "Pipeline run failed");
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}
