//! Numeric field types.

use super::{Field, FieldOptions};
use crate::error::ValidationError;
use crate::value::SqlValue;

/// A standard integer field (32-bit range by default).
///
/// Values are coerced numerically before the range check, so `"42"` and
/// `42.9` both count as 42, while booleans are not numeric. An
/// auto-increment field accepts NULL, which stands for "not assigned by the
/// database yet".
#[derive(Debug, Clone)]
pub struct IntegerField {
    /// Inclusive lower bound.
    pub min: i64,
    /// Inclusive upper bound.
    pub max: i64,
    /// Whether the database assigns this column on insert.
    pub auto_increment: bool,
    /// Field options.
    pub options: FieldOptions,
}

impl IntegerField {
    /// Creates a new IntegerField.
    pub fn new() -> Self {
        Self {
            min: i64::from(i32::MIN),
            max: i64::from(i32::MAX),
            auto_increment: false,
            options: FieldOptions::new(),
        }
    }

    /// Creates an auto-increment primary key field.
    pub fn auto() -> Self {
        Self::new()
            .auto_increment(true)
            .options(FieldOptions::new().primary_key(true))
    }

    /// Sets the allowed range.
    #[must_use]
    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Sets the auto_increment flag.
    #[must_use]
    pub fn auto_increment(mut self, value: bool) -> Self {
        self.auto_increment = value;
        self
    }

    /// Sets field options.
    #[must_use]
    pub fn options(mut self, options: FieldOptions) -> Self {
        self.options = options;
        self
    }
}

impl Default for IntegerField {
    fn default() -> Self {
        Self::new()
    }
}

impl Field for IntegerField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    fn check(&self, value: &SqlValue) -> Result<(), ValidationError> {
        let int_value = value.as_integer().ok_or_else(|| ValidationError::NotNumeric {
            value: value.clone(),
        })?;

        if int_value < self.min || int_value > self.max {
            return Err(ValidationError::OutOfRange {
                value: int_value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_field_validation() {
        let field = IntegerField::new();
        assert!(field.validate(&SqlValue::Int(42)).is_ok());
        assert!(field.validate(&SqlValue::Text("42".to_string())).is_ok());
        assert_eq!(
            field.validate(&SqlValue::Text("abc".to_string())),
            Err(ValidationError::NotNumeric {
                value: SqlValue::Text("abc".to_string())
            })
        );
    }

    #[test]
    fn test_integer_field_rejects_booleans() {
        let field = IntegerField::new();
        for flag in [true, false] {
            assert_eq!(
                field.validate(&SqlValue::Bool(flag)),
                Err(ValidationError::NotNumeric {
                    value: SqlValue::Bool(flag)
                })
            );
        }
    }

    #[test]
    fn test_integer_field_range() {
        let field = IntegerField::new().range(0, 150);
        assert!(field.validate(&SqlValue::Int(0)).is_ok());
        assert!(field.validate(&SqlValue::Int(150)).is_ok());
        assert_eq!(
            field.validate(&SqlValue::Int(151)),
            Err(ValidationError::OutOfRange {
                value: 151,
                min: 0,
                max: 150
            })
        );
        // Coercion truncates before the range check.
        assert!(field.validate(&SqlValue::Float(150.9)).is_ok());
    }

    #[test]
    fn test_default_range_is_i32() {
        let field = IntegerField::new();
        assert!(field.validate(&SqlValue::Int(i64::from(i32::MAX))).is_ok());
        assert!(field
            .validate(&SqlValue::Int(i64::from(i32::MAX) + 1))
            .is_err());
    }

    #[test]
    fn test_auto_increment_accepts_null() {
        assert!(IntegerField::auto().validate(&SqlValue::Null).is_ok());
        assert_eq!(
            IntegerField::new().validate(&SqlValue::Null),
            Err(ValidationError::NullNotAllowed)
        );
    }
}
