//! Load stage: drains record batches into the destination.

use crate::schema::{SchemaDelta, TrackedSchema};
use crate::sink::{RecordSink, SinkError};
use fhirtab_common::queue::{Message, QueueReceiver};
use fhirtab_common::types::{column_union, RecordBatch};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Column asserted as primary key on every destination table.
pub const PRIMARY_KEY_COLUMN: &str = "id";

/// Counts for one load run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Batches taken off the queue.
    pub batches: usize,
    /// Batches that failed partway and were abandoned.
    pub failed_batches: usize,
    /// Rows stored through batches that completed.
    pub rows: usize,
}

impl LoadSummary {
    /// True when every batch was stored in full.
    pub fn all_loaded(&self) -> bool {
        self.failed_batches == 0
    }
}

/// The load stage.
pub struct LoadStage<S> {
    sink: S,
    schema: TrackedSchema,
    pk_attempted: HashSet<String>,
    batches: QueueReceiver<RecordBatch>,
}

impl<S: RecordSink> LoadStage<S> {
    pub fn new(sink: S, batches: QueueReceiver<RecordBatch>) -> Self {
        Self {
            sink,
            schema: TrackedSchema::new(),
            pk_attempted: HashSet::new(),
            batches,
        }
    }

    /// Run until the batch stream ends.
    ///
    /// A failed batch is logged, counted, and abandoned; later batches
    /// still load. This stage never aborts the run.
    pub async fn process_batches(mut self) -> LoadSummary {
        let mut summary = LoadSummary::default();
        loop {
            let batch = match self.batches.dequeue().await {
                Message::Item(batch) => batch,
                Message::Sentinel => break,
            };

            summary.batches += 1;
            match self.load_batch(&batch).await {
                Ok(rows) => {
                    summary.rows += rows;
                    debug!(rows, "batch stored");
                }
                Err(err) => {
                    error!(error = %err, "failed to store batch");
                    summary.failed_batches += 1;
                }
            }
        }

        info!(
            batches = summary.batches,
            failed = summary.failed_batches,
            rows = summary.rows,
            "load finished"
        );
        summary
    }

    async fn load_batch(&mut self, batch: &RecordBatch) -> Result<usize, SinkError> {
        let mut rows_written = 0;
        for (table, rows) in batch.tables() {
            // Resources that flattened to nothing have no cells to store.
            let columns = column_union(rows);
            if columns.is_empty() {
                continue;
            }
            let delta = self.schema.delta(table, &columns);
            if let SchemaDelta::NewColumns(new_columns) = &delta {
                for column in new_columns {
                    self.sink.add_column(table, column).await?;
                    self.schema.record_column(table, column);
                }
            }

            let column_list: Vec<String> = columns.iter().cloned().collect();
            self.sink.append_rows(table, &column_list, rows).await?;
            rows_written += rows.len();

            if matches!(delta, SchemaDelta::FirstSight) {
                self.schema.record_table(table, columns);
            }

            // One attempt per table. A refusal (table already keyed, or
            // duplicate ids) degrades the guarantee, not the run.
            if self.pk_attempted.insert(table.to_string()) {
                if let Err(err) = self
                    .sink
                    .declare_primary_key(table, PRIMARY_KEY_COLUMN)
                    .await
                {
                    warn!(table = %table, error = %err, "primary key not declared");
                }
            }
        }
        Ok(rows_written)
    }
}
