//! Error types for the ORM.

use std::fmt;

use thiserror::Error;

use crate::value::SqlValue;

/// ORM-specific errors.
#[derive(Debug, Error)]
pub enum OrmError {
    /// One or more field values failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The model, query or filter is set up in a way that can never work.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A column that is not part of the model schema was accessed.
    #[error(
        "field \"{field}\" does not exist in model \"{model}\"; available fields are: {}",
        .available.join(", ")
    )]
    FieldNotFound {
        /// The column that was requested.
        field: String,
        /// Table name of the model.
        model: String,
        /// Every column the schema declares, in schema order.
        available: Vec<String>,
    },

    /// The persistence gateway failed. The source error is kept untouched.
    #[error("execution error: {0}")]
    Execution(Box<dyn std::error::Error + Send + Sync>),

    /// No object found matching the query.
    #[error("query for a single \"{model}\" object returned no entry")]
    ObjectDoesNotExist {
        /// Table name of the model.
        model: String,
    },

    /// Multiple objects found when exactly one was expected.
    #[error("query for a single \"{model}\" object returned {count} entries")]
    MultipleObjectsReturned {
        /// Table name of the model.
        model: String,
        /// Number of rows the query produced.
        count: usize,
    },

    /// `current()` was called while the query cursor is past the end.
    #[error("query cursor {index} is out of range for {len} results")]
    InvalidCursor {
        /// Cursor position.
        index: usize,
        /// Number of buffered results.
        len: usize,
    },
}

impl OrmError {
    /// Wraps a gateway failure.
    pub fn execution(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Execution(err.into())
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// A field value that does not satisfy its field definition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// NULL given to a field that does not allow it.
    #[error("value was NULL, but NULL is not allowed for this field")]
    NullNotAllowed,

    /// A text field received something other than text.
    #[error("value {value} is not a string")]
    NotText {
        /// The rejected value.
        value: SqlValue,
    },

    /// Text longer than the field's maximum length.
    #[error("value is too long: length is {length}, max length is {max_length}")]
    TooLong {
        /// The rejected value.
        value: String,
        /// UTF-8 byte length of the value.
        length: usize,
        /// Maximum allowed byte length.
        max_length: usize,
    },

    /// A numeric field received a value that does not coerce to a number.
    #[error("value {value} is not numeric")]
    NotNumeric {
        /// The rejected value.
        value: SqlValue,
    },

    /// A coerced integer outside the field's range.
    #[error("value of {value} is not in the defined range [{min}, {max}]")]
    OutOfRange {
        /// The coerced value.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },

    /// A boolean field received something other than a boolean or 0/1.
    #[error("value {value} is not a boolean")]
    NotBoolean {
        /// The rejected value.
        value: SqlValue,
    },

    /// Every failing field of one model instance.
    #[error("validation error for \"{model}\" model: {}", FieldErrors(.errors))]
    Model {
        /// Table name of the model.
        model: String,
        /// Per-column failures, in schema order.
        errors: Vec<(String, ValidationError)>,
    },
}

impl ValidationError {
    /// Returns the failure recorded for `column` in an aggregated error.
    #[must_use]
    pub fn field_error(&self, column: &str) -> Option<&ValidationError> {
        match self {
            Self::Model { errors, .. } => errors
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, err)| err),
            _ => None,
        }
    }
}

struct FieldErrors<'a>(&'a [(String, ValidationError)]);

impl fmt::Display for FieldErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (column, err)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{column}: {err}")?;
        }
        Ok(())
    }
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_not_found_lists_columns() {
        let err = OrmError::FieldNotFound {
            field: "age".to_string(),
            model: "user".to_string(),
            available: vec!["id".to_string(), "name".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "field \"age\" does not exist in model \"user\"; available fields are: id, name"
        );
    }

    #[test]
    fn test_aggregated_validation_message() {
        let err = ValidationError::Model {
            model: "user".to_string(),
            errors: vec![
                ("id".to_string(), ValidationError::NullNotAllowed),
                (
                    "age".to_string(),
                    ValidationError::OutOfRange {
                        value: 200,
                        min: 0,
                        max: 150,
                    },
                ),
            ],
        };
        assert_eq!(
            err.to_string(),
            "validation error for \"user\" model: id: value was NULL, but NULL is not \
             allowed for this field; age: value of 200 is not in the defined range [0, 150]"
        );
        assert_eq!(err.field_error("id"), Some(&ValidationError::NullNotAllowed));
        assert!(err.field_error("name").is_none());
    }
}
