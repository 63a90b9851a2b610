//! Model schemas.
//!
//! A `ModelSchema` is the table name plus the ordered column definitions of a
//! model. Schemas are read-only once built and shared through `Arc`; the
//! `Model` trait resolves each model type's schema once and caches it.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::error::{OrmError, Result};
use crate::fields::Field;
use crate::gateway::SharedGateway;
use crate::instance::ModelInstance;
use crate::queryset::QuerySet;

/// Table name and ordered field definitions of a model.
pub struct ModelSchema {
    table_name: String,
    fields: Vec<(String, Box<dyn Field>)>,
}

impl fmt::Debug for ModelSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSchema")
            .field("table_name", &self.table_name)
            .field("columns", &self.columns().collect::<Vec<_>>())
            .finish()
    }
}

impl ModelSchema {
    /// Starts building a schema for `table_name`.
    pub fn builder(table_name: impl Into<String>) -> ModelSchemaBuilder {
        ModelSchemaBuilder {
            table_name: table_name.into(),
            fields: Vec::new(),
        }
    }

    /// Returns the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the column names in schema order.
    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|(column, _)| column.as_str())
    }

    /// Returns the `(column, field)` pairs in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &dyn Field)> + '_ {
        self.fields
            .iter()
            .map(|(column, field)| (column.as_str(), field.as_ref()))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always `false` for a built schema.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the position of `column` in schema order.
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.fields.iter().position(|(name, _)| name == column)
    }

    /// Returns the field definition of `column`.
    pub fn field(&self, column: &str) -> Option<&dyn Field> {
        self.index_of(column).map(|i| self.fields[i].1.as_ref())
    }

    /// Primary-key columns in schema order.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields
            .iter()
            .filter(|(_, field)| field.is_primary_key())
            .map(|(column, _)| column.as_str())
    }

    /// The auto-increment column, if any.
    pub fn auto_increment_column(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, field)| field.is_auto_increment())
            .map(|(column, _)| column.as_str())
    }

    /// Builds a `FieldNotFound` error for `column`.
    pub(crate) fn field_not_found(&self, column: &str) -> OrmError {
        OrmError::FieldNotFound {
            field: column.to_string(),
            model: self.table_name.clone(),
            available: self.columns().map(str::to_string).collect(),
        }
    }
}

/// Builder for [`ModelSchema`].
#[derive(Debug)]
pub struct ModelSchemaBuilder {
    table_name: String,
    fields: Vec<(String, Box<dyn Field>)>,
}

impl ModelSchemaBuilder {
    /// Appends a column.
    #[must_use]
    pub fn field(mut self, column: impl Into<String>, field: impl Field + 'static) -> Self {
        self.fields.push((column.into(), Box::new(field)));
        self
    }

    /// Appends an already boxed column definition.
    #[must_use]
    pub fn boxed_field(mut self, column: impl Into<String>, field: Box<dyn Field>) -> Self {
        self.fields.push((column.into(), field));
        self
    }

    /// Checks the definition and freezes it.
    pub fn build(self) -> Result<Arc<ModelSchema>> {
        if self.table_name.trim().is_empty() {
            return Err(OrmError::configuration("model schema has an empty table name"));
        }
        if self.fields.is_empty() {
            return Err(OrmError::configuration(format!(
                "model \"{}\" declares no fields",
                self.table_name
            )));
        }

        for (i, (column, _)) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|(seen, _)| seen == column) {
                return Err(OrmError::configuration(format!(
                    "model \"{}\" declares column \"{column}\" more than once",
                    self.table_name
                )));
            }
        }

        let auto_columns: Vec<&str> = self
            .fields
            .iter()
            .filter(|(_, field)| field.is_auto_increment())
            .map(|(column, _)| column.as_str())
            .collect();
        if auto_columns.len() > 1 {
            return Err(OrmError::configuration(format!(
                "model \"{}\" declares more than one auto-increment column: {}",
                self.table_name,
                auto_columns.join(", ")
            )));
        }

        Ok(Arc::new(ModelSchema {
            table_name: self.table_name,
            fields: self.fields,
        }))
    }
}

/// A database model.
///
/// Implementors describe their table; everything else (query sets, new
/// instances, the cached schema) is provided.
///
/// # Example
///
/// ```
/// use oxide_link::fields::{CharField, Field, IntegerField};
/// use oxide_link::Model;
///
/// struct User;
///
/// impl Model for User {
///     fn table_name() -> &'static str {
///         "user"
///     }
///
///     fn field_definitions() -> Vec<(&'static str, Box<dyn Field>)> {
///         vec![
///             ("id", Box::new(IntegerField::auto())),
///             ("name", Box::new(CharField::new(10))),
///         ]
///     }
/// }
///
/// let schema = User::schema().unwrap();
/// assert_eq!(schema.table_name(), "user");
/// ```
pub trait Model: 'static {
    /// Returns the table name.
    fn table_name() -> &'static str;

    /// Returns the ordered column definitions.
    fn field_definitions() -> Vec<(&'static str, Box<dyn Field>)>;

    /// Returns the schema, building and caching it on first use.
    fn schema() -> Result<Arc<ModelSchema>> {
        resolve_schema(TypeId::of::<Self>(), || {
            Self::field_definitions().into_iter().fold(
                ModelSchema::builder(Self::table_name()),
                |builder, (column, field)| builder.boxed_field(column, field),
            )
        })
    }

    /// Returns a query set over all rows of this model.
    fn objects(gateway: &SharedGateway) -> Result<QuerySet> {
        Ok(QuerySet::new(Self::schema()?, Arc::clone(gateway)))
    }

    /// Returns a new, unsaved instance with default values.
    fn create(gateway: &SharedGateway) -> Result<ModelInstance> {
        Ok(ModelInstance::new(Self::schema()?, Arc::clone(gateway)))
    }
}

type SchemaRegistry = Mutex<HashMap<TypeId, Arc<ModelSchema>>>;

fn registry() -> &'static SchemaRegistry {
    static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

fn resolve_schema(
    type_id: TypeId,
    build: impl FnOnce() -> ModelSchemaBuilder,
) -> Result<Arc<ModelSchema>> {
    let mut schemas = registry().lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(schema) = schemas.get(&type_id) {
        return Ok(Arc::clone(schema));
    }

    // A malformed schema is not cached, so every use reports it again.
    let schema = build().build()?;
    debug!(table = %schema.table_name(), columns = schema.len(), "Registered model schema");
    schemas.insert(type_id, Arc::clone(&schema));
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{CharField, FieldOptions, IntegerField};

    fn user_schema() -> Arc<ModelSchema> {
        ModelSchema::builder("user")
            .field("id", IntegerField::auto())
            .field("name", CharField::new(10))
            .field(
                "team",
                IntegerField::new().options(FieldOptions::new().primary_key(true)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_columns_keep_declaration_order() {
        let schema = user_schema();
        assert_eq!(schema.columns().collect::<Vec<_>>(), ["id", "name", "team"]);
        assert_eq!(schema.index_of("team"), Some(2));
        assert!(schema.field("missing").is_none());
    }

    #[test]
    fn test_primary_key_columns() {
        let schema = user_schema();
        assert_eq!(
            schema.primary_key_columns().collect::<Vec<_>>(),
            ["id", "team"]
        );
        assert_eq!(schema.auto_increment_column(), Some("id"));
    }

    #[test]
    fn test_multiple_auto_increment_rejected() {
        let result = ModelSchema::builder("t")
            .field("a", IntegerField::auto())
            .field("b", IntegerField::new().auto_increment(true))
            .build();
        assert!(matches!(result, Err(OrmError::Configuration(_))));
    }

    #[test]
    fn test_empty_and_duplicate_definitions_rejected() {
        assert!(matches!(
            ModelSchema::builder("").field("a", CharField::new(1)).build(),
            Err(OrmError::Configuration(_))
        ));
        assert!(matches!(
            ModelSchema::builder("t").build(),
            Err(OrmError::Configuration(_))
        ));
        assert!(matches!(
            ModelSchema::builder("t")
                .field("a", CharField::new(1))
                .field("a", CharField::new(2))
                .build(),
            Err(OrmError::Configuration(_))
        ));
    }

    struct Broken;

    impl Model for Broken {
        fn table_name() -> &'static str {
            "broken"
        }

        fn field_definitions() -> Vec<(&'static str, Box<dyn Field>)> {
            vec![
                ("a", Box::new(IntegerField::auto())),
                ("b", Box::new(IntegerField::auto())),
            ]
        }
    }

    struct Tag;

    impl Model for Tag {
        fn table_name() -> &'static str {
            "tag"
        }

        fn field_definitions() -> Vec<(&'static str, Box<dyn Field>)> {
            vec![("label", Box::new(CharField::new(20)))]
        }
    }

    #[test]
    fn test_model_schema_is_cached() {
        let first = Tag::schema().unwrap();
        let second = Tag::schema().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_malformed_model_fails_at_first_use() {
        assert!(matches!(Broken::schema(), Err(OrmError::Configuration(_))));
        assert!(matches!(Broken::schema(), Err(OrmError::Configuration(_))));
    }
}
