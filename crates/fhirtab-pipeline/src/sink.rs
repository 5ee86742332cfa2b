//! Storage abstraction for the load stage.

use async_trait::async_trait;
use fhirtab_common::types::FlattenedRow;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors surfaced by a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("sink rejected write: {0}")]
    Rejected(String),
}

/// Destination for flattened rows.
///
/// The Postgres implementation lives in [`crate::db`]; [`MemorySink`]
/// records calls for tests.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Append rows to `table`, creating the table when it does not exist.
    /// A row missing one of `columns` stores NULL there.
    async fn append_rows(
        &self,
        table: &str,
        columns: &[String],
        rows: &[FlattenedRow],
    ) -> Result<(), SinkError>;

    /// Add a text column to an existing table.
    async fn add_column(&self, table: &str, column: &str) -> Result<(), SinkError>;

    /// Declare a primary key on an existing table.
    async fn declare_primary_key(&self, table: &str, column: &str) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: RecordSink + ?Sized> RecordSink for Arc<T> {
    async fn append_rows(
        &self,
        table: &str,
        columns: &[String],
        rows: &[FlattenedRow],
    ) -> Result<(), SinkError> {
        (**self).append_rows(table, columns, rows).await
    }

    async fn add_column(&self, table: &str, column: &str) -> Result<(), SinkError> {
        (**self).add_column(table, column).await
    }

    async fn declare_primary_key(&self, table: &str, column: &str) -> Result<(), SinkError> {
        (**self).declare_primary_key(table, column).await
    }
}

/// One operation accepted by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkOp {
    Append {
        table: String,
        columns: Vec<String>,
        rows: Vec<FlattenedRow>,
    },
    AddColumn {
        table: String,
        column: String,
    },
    DeclarePrimaryKey {
        table: String,
        column: String,
    },
}

/// In-memory sink for tests. Records every accepted operation in call
/// order and can be told to refuse writes to specific tables or to refuse
/// primary key declarations.
#[derive(Debug, Default)]
pub struct MemorySink {
    ops: Mutex<Vec<SinkOp>>,
    failing_tables: HashSet<String>,
    pk_conflicts: HashSet<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes and migrations against these tables fail.
    pub fn with_failing_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing_tables = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Primary key declarations on these tables fail, as they would on a
    /// table that already has one.
    pub fn with_pk_conflicts<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pk_conflicts = tables.into_iter().map(Into::into).collect();
        self
    }

    /// Ordered log of every accepted operation.
    pub async fn ops(&self) -> Vec<SinkOp> {
        self.ops.lock().await.clone()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn append_rows(
        &self,
        table: &str,
        columns: &[String],
        rows: &[FlattenedRow],
    ) -> Result<(), SinkError> {
        if self.failing_tables.contains(table) {
            return Err(SinkError::Rejected(format!("append to {table} refused")));
        }
        self.ops.lock().await.push(SinkOp::Append {
            table: table.to_string(),
            columns: columns.to_vec(),
            rows: rows.to_vec(),
        });
        Ok(())
    }

    async fn add_column(&self, table: &str, column: &str) -> Result<(), SinkError> {
        if self.failing_tables.contains(table) {
            return Err(SinkError::Rejected(format!("alter of {table} refused")));
        }
        self.ops.lock().await.push(SinkOp::AddColumn {
            table: table.to_string(),
            column: column.to_string(),
        });
        Ok(())
    }

    async fn declare_primary_key(&self, table: &str, column: &str) -> Result<(), SinkError> {
        if self.pk_conflicts.contains(table) {
            return Err(SinkError::Rejected(format!(
                "{table} already has a primary key"
            )));
        }
        self.ops.lock().await.push(SinkOp::DeclarePrimaryKey {
            table: table.to_string(),
            column: column.to_string(),
        });
        Ok(())
    }
}
