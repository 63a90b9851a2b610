//! Boolean field type.

use super::{Field, FieldOptions};
use crate::error::ValidationError;
use crate::value::SqlValue;

/// A boolean field. Accepts `Bool` values and the integers 0 and 1, which
/// is how SQLite hands booleans back.
#[derive(Debug, Clone)]
pub struct BooleanField {
    /// Field options.
    pub options: FieldOptions,
}

impl BooleanField {
    /// Creates a new BooleanField.
    pub fn new() -> Self {
        Self {
            options: FieldOptions::new(),
        }
    }

    /// Sets field options.
    #[must_use]
    pub fn options(mut self, options: FieldOptions) -> Self {
        self.options = options;
        self
    }
}

impl Default for BooleanField {
    fn default() -> Self {
        Self::new()
    }
}

impl Field for BooleanField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn check(&self, value: &SqlValue) -> Result<(), ValidationError> {
        match value {
            SqlValue::Bool(_) | SqlValue::Int(0 | 1) => Ok(()),
            other => Err(ValidationError::NotBoolean {
                value: other.clone(),
            }),
        }
    }
}
