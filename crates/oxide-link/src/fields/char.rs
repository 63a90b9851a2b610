//! Character/string field types.

use super::{Field, FieldOptions};
use crate::error::ValidationError;
use crate::value::SqlValue;

/// A character field with a maximum length.
///
/// Length is the UTF-8 byte length of the text, so multibyte characters
/// count more than once.
///
/// # Example
///
/// ```
/// use oxide_link::fields::{CharField, Field};
/// use oxide_link::SqlValue;
///
/// let field = CharField::new(10);
/// assert!(field.validate(&SqlValue::Text("short".into())).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CharField {
    /// Maximum length of the field.
    pub max_length: usize,
    /// Field options.
    pub options: FieldOptions,
}

impl CharField {
    /// Creates a new CharField with the given max length.
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
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

impl Default for CharField {
    fn default() -> Self {
        Self::new(255)
    }
}

impl Field for CharField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn check(&self, value: &SqlValue) -> Result<(), ValidationError> {
        let text = value.as_text().ok_or_else(|| ValidationError::NotText {
            value: value.clone(),
        })?;

        let length = text.len();
        if length > self.max_length {
            return Err(ValidationError::TooLong {
                value: text.to_string(),
                length,
                max_length: self.max_length,
            });
        }
        Ok(())
    }
}

/// A text field for large strings (no max length).
#[derive(Debug, Clone)]
pub struct TextField {
    /// Field options.
    pub options: FieldOptions,
}

impl TextField {
    /// Creates a new TextField.
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

impl Default for TextField {
    fn default() -> Self {
        Self::new()
    }
}

impl Field for TextField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn check(&self, value: &SqlValue) -> Result<(), ValidationError> {
        match value {
            SqlValue::Text(_) => Ok(()),
            other => Err(ValidationError::NotText {
                value: other.clone(),
            }),
        }
    }
}
