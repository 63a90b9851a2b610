//! Blocking [`Gateway`] over an sqlx SQLite pool.

use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use oxide_link::{Gateway, OrmError, Result, ResultSet, Row, SharedGateway, SqlValue, Statement};
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, trace};

use crate::config::SqliteConfig;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A SQLite connection pool driven by its own current-thread runtime.
///
/// Every statement blocks the calling thread until SQLite answers, so the
/// gateway must not be used from inside another tokio runtime.
#[derive(Debug)]
pub struct SqliteGateway {
    runtime: Runtime,
    pool: SqlitePool,
    /// Rowid produced by the most recent INSERT, 0 before the first one
    last_insert_id: Mutex<i64>,
}

impl SqliteGateway {
    /// Opens the pool described by `config`. File databases are created if
    /// missing.
    pub fn connect(config: &SqliteConfig) -> Result<Self> {
        config.check()?;

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(OrmError::execution)?;

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(OrmError::execution)?
            .create_if_missing(true);

        // In-memory databases vanish with their last connection, so pooled
        // connections are never retired.
        let pool = runtime
            .block_on(
                SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .idle_timeout(Option::<Duration>::None)
                    .max_lifetime(Option::<Duration>::None)
                    .connect_with(options),
            )
            .map_err(OrmError::execution)?;

        info!(
            url = %config.url,
            max_connections = config.max_connections,
            "Connected to SQLite"
        );

        Ok(Self {
            runtime,
            pool,
            last_insert_id: Mutex::new(0),
        })
    }

    /// Opens an in-memory database.
    pub fn memory() -> Result<Self> {
        Self::connect(&SqliteConfig::default())
    }

    /// Wraps the gateway in the shared handle models expect.
    pub fn into_shared(self) -> SharedGateway {
        Arc::new(self)
    }

    /// Runs one or more `;`-separated statements without parameters,
    /// typically schema setup.
    pub fn execute_script(&self, sql: &str) -> Result<u64> {
        debug!(sql = %sql, "Executing script");
        let done = self
            .runtime
            .block_on(sqlx::raw_sql(sql).execute(&self.pool))
            .map_err(OrmError::execution)?;
        Ok(done.rows_affected())
    }

    fn record_insert_id(&self, id: i64) {
        *self
            .last_insert_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = id;
    }
}

impl Gateway for SqliteGateway {
    fn prepare<'a>(&'a self, sql: &str) -> Result<Box<dyn Statement + 'a>> {
        Ok(Box::new(SqliteStatement {
            gateway: self,
            sql: sql.to_string(),
        }))
    }

    fn last_insert_id(&self) -> Result<i64> {
        Ok(*self
            .last_insert_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner))
    }
}

struct SqliteStatement<'a> {
    gateway: &'a SqliteGateway,
    sql: String,
}

impl Statement for SqliteStatement<'_> {
    fn execute(&mut self, params: &[SqlValue]) -> Result<ResultSet> {
        let gateway = self.gateway;
        let mut query = sqlx::query(&self.sql);
        for param in params {
            query = bind_param(query, param.clone());
        }

        if returns_rows(&self.sql) {
            let rows = gateway
                .runtime
                .block_on(query.fetch_all(&gateway.pool))
                .map_err(OrmError::execution)?;
            trace!(sql = %self.sql, rows = rows.len(), "Fetched rows");
            let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;
            Ok(ResultSet::from_rows(rows))
        } else {
            let done = gateway
                .runtime
                .block_on(query.execute(&gateway.pool))
                .map_err(OrmError::execution)?;
            trace!(
                sql = %self.sql,
                rows_affected = done.rows_affected(),
                "Executed write"
            );
            if starts_with_keyword(&self.sql, &["INSERT", "REPLACE"]) {
                gateway.record_insert_id(done.last_insert_rowid());
            }
            Ok(ResultSet::affected(done.rows_affected()))
        }
    }
}

fn starts_with_keyword(sql: &str, keywords: &[&str]) -> bool {
    let first = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default();
    keywords.iter().any(|k| first.eq_ignore_ascii_case(k))
}

/// Whether `sql` produces a row set rather than a write summary.
fn returns_rows(sql: &str) -> bool {
    starts_with_keyword(sql, &["SELECT", "WITH", "PRAGMA", "VALUES", "EXPLAIN"])
}

fn bind_param(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

/// Decodes a row by each value's storage class, ignoring declared column
/// types.
fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut decoded = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index).map_err(OrmError::execution)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            let storage = raw.type_info().name().to_string();
            match storage.as_str() {
                "INTEGER" | "BOOLEAN" | "NUMERIC" => {
                    SqlValue::Int(row.try_get_unchecked(index).map_err(OrmError::execution)?)
                }
                "REAL" => {
                    SqlValue::Float(row.try_get_unchecked(index).map_err(OrmError::execution)?)
                }
                "BLOB" => {
                    SqlValue::Blob(row.try_get_unchecked(index).map_err(OrmError::execution)?)
                }
                _ => SqlValue::Text(row.try_get_unchecked(index).map_err(OrmError::execution)?),
            }
        };
        decoded.push(column.name(), value);
    }
    Ok(decoded)
}
