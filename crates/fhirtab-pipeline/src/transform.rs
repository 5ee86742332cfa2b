//! Transform stage: flattens bundles into per-type record batches.
//!
//! One batch per bundle. Within a batch, rows are grouped by resource type
//! and every row keeps its fields in source document order.

use fhirtab_common::queue::{Message, QueueClosed, QueueReceiver, QueueSender};
use fhirtab_common::types::{FlattenedRow, RecordBatch};
use fhirtab_model::{Bundle, ModelError, ModelRegistry, Resource};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that stop the transform stage.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The bundle has no entry list at all. Distinct from an empty list,
    /// which is valid and yields an empty batch.
    #[error("bundle {bundle_id} has no entry list")]
    MissingEntries { bundle_id: String },

    #[error(transparent)]
    Queue(#[from] QueueClosed),
}

/// Counts for one transform run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformSummary {
    /// Bundles flattened into batches.
    pub bundles: usize,
    /// Rows produced across all batches.
    pub rows: usize,
    /// Entries skipped for lack of a model or a resource body.
    pub skipped_entries: usize,
}

/// The transform stage. Consumes the bundle queue and emits one batch per
/// bundle on the batch queue.
pub struct TransformStage {
    registry: ModelRegistry,
    bundles: QueueReceiver<Bundle>,
    batches: QueueSender<RecordBatch>,
}

impl TransformStage {
    pub fn new(
        registry: ModelRegistry,
        bundles: QueueReceiver<Bundle>,
        batches: QueueSender<RecordBatch>,
    ) -> Self {
        Self {
            registry,
            bundles,
            batches,
        }
    }

    /// Run until the bundle stream ends.
    ///
    /// A bundle without an entry list is fatal to the stage. The batch
    /// stream is terminated before returning the error, so the load stage
    /// drains what was produced and exits instead of waiting forever.
    pub async fn process_bundles(mut self) -> Result<TransformSummary, TransformError> {
        let mut summary = TransformSummary::default();
        loop {
            let bundle = match self.bundles.dequeue().await {
                Message::Item(bundle) => bundle,
                Message::Sentinel => break,
            };

            match self.flatten_bundle(&bundle, &mut summary) {
                Ok(batch) => {
                    debug!(
                        bundle = bundle.id.as_deref().unwrap_or("<no id>"),
                        tables = batch.table_count(),
                        rows = batch.row_count(),
                        "bundle flattened"
                    );
                    summary.bundles += 1;
                    self.batches.enqueue(batch).await?;
                }
                Err(err) => {
                    error!(error = %err, "transform failed, terminating batch stream");
                    self.batches.finish().await?;
                    return Err(err);
                }
            }
        }

        self.batches.finish().await?;
        info!(
            bundles = summary.bundles,
            rows = summary.rows,
            skipped = summary.skipped_entries,
            "transform finished"
        );
        Ok(summary)
    }

    fn flatten_bundle(
        &self,
        bundle: &Bundle,
        summary: &mut TransformSummary,
    ) -> Result<RecordBatch, TransformError> {
        let entries = bundle
            .entries()
            .ok_or_else(|| TransformError::MissingEntries {
                bundle_id: bundle.id.clone().unwrap_or_else(|| "<no id>".to_string()),
            })?;

        let mut batch = RecordBatch::new();
        for entry in entries {
            let Some(raw) = entry.resource.as_ref() else {
                warn!("entry without a resource body skipped");
                summary.skipped_entries += 1;
                continue;
            };

            match self.registry.parse(raw) {
                Ok(resource) => {
                    let row = flatten_resource(&resource);
                    batch.push_row(resource.resource_type(), row);
                    summary.rows += 1;
                }
                Err(ModelError::UnknownResourceType { resource_type }) => {
                    debug!(resource_type = %resource_type, "no model registered, entry skipped");
                    summary.skipped_entries += 1;
                }
                Err(err) => {
                    warn!(error = %err, "unparseable entry skipped");
                    summary.skipped_entries += 1;
                }
            }
        }
        Ok(batch)
    }
}

/// Flatten one resource into a single row.
///
/// Nested objects merge into their parent by key concatenation, so
/// `{"name": {"family": "Doe"}}` lands in column `namefamily`. Every leaf
/// is stored as its compact JSON text: strings keep their quotes and
/// arrays survive intact as one value.
pub fn flatten_resource(resource: &Resource) -> FlattenedRow {
    let mut row = FlattenedRow::new();
    flatten_fields("", resource.fields(), &mut row);
    row
}

fn flatten_fields(parent_key: &str, fields: &Map<String, Value>, row: &mut FlattenedRow) {
    for (name, value) in fields {
        let key = format!("{parent_key}{name}");
        match value {
            Value::Object(nested) => flatten_fields(&key, nested, row),
            other => {
                row.insert(key, other.to_string());
            }
        }
    }
}
