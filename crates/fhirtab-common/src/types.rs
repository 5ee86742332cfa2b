//! Row and batch types shared by the transform and load stages.

use indexmap::{IndexMap, IndexSet};

/// One flattened resource: composite field path mapped to the JSON text of
/// the value found at that path. Keys keep the order flattening produced
/// them in.
pub type FlattenedRow = IndexMap<String, String>;

/// Union of column names across rows, in first-seen order.
pub fn column_union(rows: &[FlattenedRow]) -> IndexSet<String> {
    let mut columns = IndexSet::new();
    for row in rows {
        for key in row.keys() {
            columns.insert(key.clone());
        }
    }
    columns
}

/// Rows produced from a single bundle, grouped by resource type.
///
/// Batches are per-bundle by construction: the transform stage starts a
/// fresh batch for every bundle and never merges rows across bundles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    tables: IndexMap<String, Vec<FlattenedRow>>,
}

impl RecordBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row under the given resource type, preserving entry order
    /// within the type and first-seen order across types.
    pub fn push_row(&mut self, resource_type: &str, row: FlattenedRow) {
        self.tables.entry(resource_type.to_string()).or_default().push(row);
    }

    /// True when no entry of the source bundle produced a row.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of distinct resource types in this batch.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Total row count across all resource types.
    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Rows grouped per resource type, in first-seen order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &[FlattenedRow])> {
        self.tables.iter().map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    /// Rows recorded for one resource type, if any.
    pub fn rows_for(&self, resource_type: &str) -> Option<&[FlattenedRow]> {
        self.tables.get(resource_type).map(Vec::as_slice)
    }
}
