//! The persistence gateway contract.
//!
//! The ORM never talks to a database driver directly. It prepares a
//! statement, executes it once with the bound parameters, and reads the rows
//! back through these traits. A gateway is built once and shared by every
//! query set and model instance that uses it.

use std::sync::Arc;

use crate::error::Result;
use crate::instance::ModelInstance;
use crate::schema::ModelSchema;
use crate::value::SqlValue;

/// A database connection as seen by the ORM.
///
/// Calls block until the database answers. Implementations are shared
/// through [`SharedGateway`]; the ORM adds no locking of its own, so callers
/// that use one gateway from several threads must serialize access.
pub trait Gateway: Send + Sync {
    /// Prepares `sql` for a single execution.
    fn prepare<'a>(&'a self, sql: &str) -> Result<Box<dyn Statement + 'a>>;

    /// Returns the identifier generated by the most recent insert.
    ///
    /// Only meaningful immediately after an `INSERT`.
    fn last_insert_id(&self) -> Result<i64>;
}

/// A shared gateway handle.
pub type SharedGateway = Arc<dyn Gateway>;

/// A prepared statement. Dropped right after its single execution.
pub trait Statement {
    /// Executes the statement with `params` bound to its `?` placeholders
    /// in order.
    fn execute(&mut self, params: &[SqlValue]) -> Result<ResultSet>;
}

/// One fetched row: column names and values in select order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column value.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: SqlValue) -> Self {
        self.push(column, value);
        self
    }

    /// Appends a column value.
    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.columns.push((column.into(), value));
    }

    /// Returns the value of `column`.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Iterates over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> + '_ {
        self.columns
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }
}

impl FromIterator<(String, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// The outcome of executing a statement. Writes usually carry no rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    rows: Vec<Row>,
    rows_affected: u64,
}

impl ResultSet {
    /// A result set holding fetched rows.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let rows_affected = rows.len() as u64;
        Self {
            rows,
            rows_affected,
        }
    }

    /// A row-less result of a write.
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows: Vec::new(),
            rows_affected,
        }
    }

    /// The fetched rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows touched by a write, or fetched by a read.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Materializes every row as a persisted instance of `schema`.
    pub fn fetch_all_as(
        self,
        schema: &Arc<ModelSchema>,
        gateway: &SharedGateway,
    ) -> Result<Vec<ModelInstance>> {
        self.rows
            .into_iter()
            .map(|row| ModelInstance::from_row(Arc::clone(schema), Arc::clone(gateway), row))
            .collect()
    }
}
