//! Destination schema tracking.
//!
//! The load stage never introspects the database. It remembers what it has
//! written, and tracking is write-through: a table or column is recorded
//! only after the corresponding write or migration succeeded, so a failed
//! migration is retried on the next batch that carries the column.

use indexmap::IndexSet;
use std::collections::HashMap;

/// What the load stage believes the destination schema looks like.
#[derive(Debug, Clone, Default)]
pub struct TrackedSchema {
    tables: HashMap<String, IndexSet<String>>,
}

/// The schema work a batch requires before its rows can be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaDelta {
    /// The table has never been written; create-on-write covers it.
    FirstSight,
    /// Known table; these columns are new, in first-seen order.
    NewColumns(Vec<String>),
}

impl TrackedSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare an incoming column set against the tracked shape of `table`.
    pub fn delta(&self, table: &str, columns: &IndexSet<String>) -> SchemaDelta {
        match self.tables.get(table) {
            None => SchemaDelta::FirstSight,
            Some(known) => SchemaDelta::NewColumns(
                columns
                    .iter()
                    .filter(|column| !known.contains(*column))
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// Record a table and its initial columns after its first successful
    /// write.
    pub fn record_table(&mut self, table: &str, columns: IndexSet<String>) {
        self.tables.insert(table.to_string(), columns);
    }

    /// Record one column after its migration succeeded.
    pub fn record_column(&mut self, table: &str, column: &str) {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(column.to_string());
    }

    pub fn is_tracked(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn columns(&self, table: &str) -> Option<&IndexSet<String>> {
        self.tables.get(table)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}
