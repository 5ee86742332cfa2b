//! Pipeline assembly and execution.

use crate::load::{LoadStage, LoadSummary};
use crate::sink::RecordSink;
use crate::transform::{TransformError, TransformStage, TransformSummary};
use anyhow::Context;
use fhirtab_common::queue::{channel, DEFAULT_QUEUE_CAPACITY};
use fhirtab_ingest::{BundleReader, BundleSource, IngestSummary, SourceError};
use fhirtab_model::ModelRegistry;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Queue sizing for one run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub bundle_queue_capacity: usize,
    pub batch_queue_capacity: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            bundle_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            batch_queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl PipelineOptions {
    /// Same bound for both queues.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bundle_queue_capacity: capacity,
            batch_queue_capacity: capacity,
        }
    }
}

/// Per-stage outcomes of one run.
#[derive(Debug)]
pub struct PipelineReport {
    pub ingest: Result<IngestSummary, SourceError>,
    pub transform: Result<TransformSummary, TransformError>,
    pub load: LoadSummary,
}

impl PipelineReport {
    /// True when every stage finished cleanly and every batch was stored.
    pub fn success(&self) -> bool {
        self.ingest.is_ok() && self.transform.is_ok() && self.load.all_loaded()
    }
}

/// Run ingest, transform, and load to completion over one source.
///
/// All three stages are joined whatever their individual outcomes; the
/// report carries each stage's result. An error is returned only when a
/// stage task panics.
pub async fn run_pipeline<S>(
    reader: BundleReader,
    source: BundleSource,
    registry: ModelRegistry,
    sink: S,
    options: PipelineOptions,
) -> anyhow::Result<PipelineReport>
where
    S: RecordSink + 'static,
{
    let run_id = Uuid::new_v4();
    info!(run_id = %run_id, source = %source, "pipeline starting");

    let (bundle_tx, bundle_rx) = channel(options.bundle_queue_capacity);
    let (batch_tx, batch_rx) = channel(options.batch_queue_capacity);

    let ingest = tokio::spawn(
        async move { reader.run(&source, bundle_tx).await }
            .instrument(info_span!("ingest", run_id = %run_id)),
    );
    let transform = tokio::spawn(
        TransformStage::new(registry, bundle_rx, batch_tx)
            .process_bundles()
            .instrument(info_span!("transform", run_id = %run_id)),
    );
    let load = tokio::spawn(
        LoadStage::new(sink, batch_rx)
            .process_batches()
            .instrument(info_span!("load", run_id = %run_id)),
    );

    let report = PipelineReport {
        ingest: ingest.await.context("ingest task panicked")?,
        transform: transform.await.context("transform task panicked")?,
        load: load.await.context("load task panicked")?,
    };

    if report.success() {
        info!(run_id = %run_id, "pipeline finished");
    } else {
        warn!(run_id = %run_id, "pipeline finished with failures");
    }
    Ok(report)
}
