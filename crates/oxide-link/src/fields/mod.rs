//! Field types for model definitions.
//!
//! A field describes one column: its default, whether it accepts NULL,
//! whether it is part of the primary key, and the type-specific rules a value
//! must satisfy before it is written.

mod boolean;
mod char;
mod numeric;

pub use boolean::BooleanField;
pub use char::{CharField, TextField};
pub use numeric::IntegerField;

use std::fmt::Debug;

use crate::error::ValidationError;
use crate::value::{SqlValue, ToSqlValue};

/// Common field options.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOptions {
    /// Whether the field can be null.
    pub null: bool,
    /// Default value for the field.
    pub default: SqlValue,
    /// Whether this is (part of) the primary key.
    pub primary_key: bool,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldOptions {
    /// Creates new field options with defaults.
    pub fn new() -> Self {
        Self {
            null: false,
            default: SqlValue::Null,
            primary_key: false,
        }
    }

    /// Sets the null option.
    #[must_use]
    pub fn null(mut self, value: bool) -> Self {
        self.null = value;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: impl ToSqlValue) -> Self {
        self.default = value.to_sql_value();
        self
    }

    /// Sets the primary_key option.
    #[must_use]
    pub fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }
}

/// A column descriptor with validation rules.
///
/// Implementors provide the type-specific [`check`](Field::check); the NULL
/// handling shared by every field lives in [`validate`](Field::validate).
pub trait Field: Debug + Send + Sync {
    /// Returns the field options.
    fn options(&self) -> &FieldOptions;

    /// Whether the database assigns this column on insert.
    fn is_auto_increment(&self) -> bool {
        false
    }

    /// Type-specific checks for a non-NULL value.
    fn check(&self, value: &SqlValue) -> Result<(), ValidationError>;

    /// Validates a candidate value for this field.
    ///
    /// NULL passes when the field allows it or is auto-increment (the
    /// database has not assigned a value yet); any other value goes through
    /// [`check`](Field::check).
    fn validate(&self, value: &SqlValue) -> Result<(), ValidationError> {
        if value.is_null() {
            if self.options().null || self.is_auto_increment() {
                return Ok(());
            }
            return Err(ValidationError::NullNotAllowed);
        }
        self.check(value)
    }

    /// Returns the default value.
    fn default_value(&self) -> SqlValue {
        self.options().default.clone()
    }

    /// Returns whether this field is part of the primary key.
    fn is_primary_key(&self) -> bool {
        self.options().primary_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_options_builder() {
        let options = FieldOptions::new().null(true).default("x").primary_key(true);
        assert!(options.null);
        assert!(options.primary_key);
        assert_eq!(options.default, SqlValue::Text("x".to_string()));
    }

    #[test]
    fn test_nullable_field_short_circuits() {
        // A nullable CharField must not complain that NULL is not a string.
        let field = CharField::new(5).options(FieldOptions::new().null(true));
        assert!(field.validate(&SqlValue::Null).is_ok());
    }

    #[test]
    fn test_non_nullable_rejects_null() {
        let field = CharField::new(5);
        assert_eq!(
            field.validate(&SqlValue::Null),
            Err(ValidationError::NullNotAllowed)
        );
    }
}
