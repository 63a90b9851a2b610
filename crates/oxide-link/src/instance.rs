//! Model instances and their persistence.
//!
//! A `ModelInstance` holds one value per schema column and remembers whether
//! it has been written to the database. The primary-key values of the last
//! successful save (or of the row it was loaded from) are kept in a snapshot
//! so that UPDATE and DELETE target the stored row even after the in-memory
//! primary key has been changed.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::error::{OrmError, Result, ValidationError};
use crate::gateway::{ResultSet, Row, SharedGateway};
use crate::schema::ModelSchema;
use crate::value::{SqlValue, ToSqlValue};

/// One record of a model.
///
/// # Example
///
/// ```ignore
/// let mut user = User::create(&gateway)?;
/// user.set("name", "Alice")?;
/// user.save()?; // INSERT, then `id` holds the generated key
///
/// user.set("name", "Alicia")?;
/// user.save()?; // UPDATE ... WHERE id = ?
///
/// user.delete()?;
/// assert!(!user.exists());
/// ```
#[derive(Clone)]
pub struct ModelInstance {
    schema: Arc<ModelSchema>,
    gateway: SharedGateway,
    /// One value per schema column, in schema order
    values: Vec<SqlValue>,
    exists: bool,
    /// Primary key as of the last successful persistence operation
    pk_cache: Vec<(String, SqlValue)>,
}

impl fmt::Debug for ModelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelInstance")
            .field("table", &self.schema.table_name())
            .field("values", &self.values().collect::<Vec<_>>())
            .field("exists", &self.exists)
            .field("pk_cache", &self.pk_cache)
            .finish()
    }
}

impl ModelInstance {
    /// Creates an unsaved instance holding every field's default.
    pub fn new(schema: Arc<ModelSchema>, gateway: SharedGateway) -> Self {
        let values = schema.fields().map(|(_, field)| field.default_value()).collect();
        Self {
            schema,
            gateway,
            values,
            exists: false,
            pk_cache: Vec::new(),
        }
    }

    /// Materializes a fetched row as a persisted instance.
    ///
    /// Columns missing from the row keep their defaults. A missing
    /// primary-key column is a `Configuration` error; a column the schema
    /// does not know is `FieldNotFound`.
    pub fn from_row(schema: Arc<ModelSchema>, gateway: SharedGateway, row: Row) -> Result<Self> {
        if let Some(missing) = schema
            .primary_key_columns()
            .find(|column| row.get(column).is_none())
        {
            return Err(OrmError::configuration(format!(
                "row fetched from \"{}\" lacks primary-key column \"{missing}\"",
                schema.table_name()
            )));
        }

        let mut instance = Self::new(schema, gateway);
        for (column, value) in row.iter() {
            let index = instance.column_index(column)?;
            instance.values[index] = value.clone();
        }
        instance.mark_persisted();
        Ok(instance)
    }

    /// Returns the model schema.
    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// Whether the instance is stored in the database.
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Primary-key values recorded by the last successful save or load.
    ///
    /// Stale after `delete()`; only consulted while `exists()` is true.
    pub fn pk_cache(&self) -> &[(String, SqlValue)] {
        &self.pk_cache
    }

    fn column_index(&self, column: &str) -> Result<usize> {
        self.schema
            .index_of(column)
            .ok_or_else(|| self.schema.field_not_found(column))
    }

    /// Returns the current value of `column`.
    pub fn get(&self, column: &str) -> Result<&SqlValue> {
        let index = self.column_index(column)?;
        Ok(&self.values[index])
    }

    /// Sets `column`. The value is validated on `save()`, not here.
    pub fn set(&mut self, column: &str, value: impl ToSqlValue) -> Result<()> {
        let index = self.column_index(column)?;
        self.values[index] = value.to_sql_value();
        Ok(())
    }

    /// Puts the field default back into `column`.
    pub fn reset(&mut self, column: &str) -> Result<()> {
        let index = self.column_index(column)?;
        self.values[index] = self
            .schema
            .field(column)
            .map_or(SqlValue::Null, |field| field.default_value());
        Ok(())
    }

    /// Iterates over `(column, value)` pairs in schema order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &SqlValue)> + '_ {
        self.schema.columns().zip(self.values.iter())
    }

    /// Current (possibly unsaved) primary-key values.
    pub fn primary_key(&self) -> Vec<(&str, &SqlValue)> {
        self.schema
            .fields()
            .zip(self.values.iter())
            .filter(|((_, field), _)| field.is_primary_key())
            .map(|((column, _), value)| (column, value))
            .collect()
    }

    /// Validates every field and reports all failures together.
    pub fn validate(&self) -> Result<()> {
        let errors: Vec<(String, ValidationError)> = self
            .schema
            .fields()
            .zip(self.values.iter())
            .filter_map(|((column, field), value)| {
                field
                    .validate(value)
                    .err()
                    .map(|err| (column.to_string(), err))
            })
            .collect();

        if errors.is_empty() {
            return Ok(());
        }

        warn!(
            table = %self.schema.table_name(),
            failed = errors.len(),
            "Model validation failed"
        );
        Err(ValidationError::Model {
            model: self.schema.table_name().to_string(),
            errors,
        }
        .into())
    }

    /// Writes the instance to the database.
    ///
    /// A new instance is INSERTed; a stored one is UPDATEd, locating the row
    /// by the primary key recorded at the last save or load. Nothing is sent
    /// to the database when validation fails.
    pub fn save(&mut self) -> Result<()> {
        self.validate()?;

        let inserting = !self.exists;
        let (sql, params) = if inserting {
            self.build_insert()
        } else {
            self.build_update()?
        };
        self.execute(&sql, &params)?;

        if inserting {
            if let Some(index) = self.auto_increment_index() {
                let id = self.gateway.last_insert_id()?;
                trace!(table = %self.schema.table_name(), id, "Assigned generated key");
                self.values[index] = SqlValue::Int(id);
            }
        }

        self.mark_persisted();
        Ok(())
    }

    /// Deletes the stored row. Does nothing for an unsaved instance.
    ///
    /// The instance keeps its values; saving it again INSERTs a new row.
    pub fn delete(&mut self) -> Result<()> {
        if !self.exists {
            trace!(table = %self.schema.table_name(), "Delete skipped, instance not stored");
            return Ok(());
        }

        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.schema.table_name(),
            self.pk_where_clause()?
        );
        let params: Vec<SqlValue> = self.pk_cache.iter().map(|(_, v)| v.clone()).collect();
        self.execute(&sql, &params)?;

        self.exists = false;
        Ok(())
    }

    fn build_insert(&self) -> (String, Vec<SqlValue>) {
        let columns: Vec<&str> = self.schema.columns().collect();
        let placeholders = vec![SqlValue::placeholder(); columns.len()];
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.schema.table_name(),
            columns.join(", "),
            placeholders.join(", ")
        );
        (sql, self.values.clone())
    }

    fn build_update(&self) -> Result<(String, Vec<SqlValue>)> {
        let assignments: Vec<String> = self
            .schema
            .columns()
            .map(|column| format!("{column} = ?"))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.schema.table_name(),
            assignments.join(", "),
            self.pk_where_clause()?
        );

        let mut params = self.values.clone();
        params.extend(self.pk_cache.iter().map(|(_, v)| v.clone()));
        Ok((sql, params))
    }

    fn pk_where_clause(&self) -> Result<String> {
        let conditions: Vec<String> = self
            .pk_cache
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect();
        if conditions.is_empty() {
            return Err(OrmError::configuration(format!(
                "model \"{}\" has no primary key; stored rows cannot be located",
                self.schema.table_name()
            )));
        }
        Ok(conditions.join(" AND "))
    }

    fn auto_increment_index(&self) -> Option<usize> {
        self.schema
            .auto_increment_column()
            .and_then(|column| self.schema.index_of(column))
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<ResultSet> {
        debug!(sql = %sql, params = params.len(), "Executing statement");
        let mut statement = self.gateway.prepare(sql)?;
        statement.execute(params)
    }

    fn mark_persisted(&mut self) {
        self.exists = true;
        self.pk_cache = self
            .primary_key()
            .into_iter()
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect();
    }
}

impl fmt::Display for ModelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.exists { "existing" } else { "new" };
        write!(f, "{} instance ({state}", self.schema.table_name())?;
        for (column, value) in self.primary_key() {
            write!(f, ", {column}={value}")?;
        }
        write!(f, ")")
    }
}
