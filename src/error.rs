//! Error types for parsing, binding and writing multi-type CSV documents.
//!
//! ## Error Categories
//!
//! - **Configuration conflicts**: prefixes that would make lines ambiguous,
//!   or structured metadata naming fields its record type does not have.
//!   These are raised before a single row is materialized.
//! - **Schema definition errors**: value rows without a property block, or
//!   two property blocks for one schema.
//! - **Binding errors**: a typeless row could not be coerced into the
//!   requested Rust type.
//!
//! Arity mismatches, unresolved references and unknown configuration keys are
//! recoverable and never surface as an [`Error`].
//!
//! ## Examples
//!
//! ```rust
//! use serde_mtcsv::{parse, Error};
//!
//! let result = parse("Values,Foo,1,2");
//! assert!(matches!(result, Err(Error::MissingSchemaDefinition { .. })));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised by the record engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Two prefixes collide, or a metadata declaration does not fit its record type.
    #[error("Configuration conflict for prefix '{prefix}'{}: {msg}", schema_suffix(.schema))]
    ConfigConflict {
        prefix: String,
        schema: Option<String>,
        msg: String,
    },

    /// Value rows exist for a schema that has no property block.
    #[error("Schema '{schema}' has value rows but no property block")]
    MissingSchemaDefinition { schema: String },

    /// More than one property block was found for the same schema.
    #[error("Schema '{schema}' defines its property block more than once")]
    DuplicateSchemaDefinition { schema: String },

    /// Binding was requested for a schema the document does not contain.
    #[error("Unknown schema '{schema}'")]
    UnknownSchema { schema: String },

    /// A row could not be materialized into the requested type.
    #[error("Cannot bind row {row} of schema '{schema}': {msg}")]
    Binding {
        schema: String,
        row: usize,
        msg: String,
    },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),

    /// Generic message
    #[error("{0}")]
    Message(String),
}

fn schema_suffix(schema: &Option<String>) -> String {
    schema
        .as_ref()
        .map(|s| format!(" (schema '{}')", s))
        .unwrap_or_default()
}

impl Error {
    /// Creates a configuration conflict that is not tied to one schema.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_mtcsv::Error;
    ///
    /// let err = Error::config_conflict("Values", "property prefix equals value prefix");
    /// assert!(err.to_string().contains("'Values'"));
    /// ```
    pub fn config_conflict(prefix: &str, msg: &str) -> Self {
        Error::ConfigConflict {
            prefix: prefix.to_string(),
            schema: None,
            msg: msg.to_string(),
        }
    }

    /// Creates a configuration conflict detected while resolving one schema's prefixes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_mtcsv::Error;
    ///
    /// let err = Error::schema_conflict("Meta", "Foo", "metadata prefix equals value prefix");
    /// assert!(err.to_string().contains("schema 'Foo'"));
    /// ```
    pub fn schema_conflict(prefix: &str, schema: &str, msg: &str) -> Self {
        Error::ConfigConflict {
            prefix: prefix.to_string(),
            schema: Some(schema.to_string()),
            msg: msg.to_string(),
        }
    }

    pub fn missing_schema(schema: &str) -> Self {
        Error::MissingSchemaDefinition {
            schema: schema.to_string(),
        }
    }

    pub fn duplicate_schema(schema: &str) -> Self {
        Error::DuplicateSchemaDefinition {
            schema: schema.to_string(),
        }
    }

    pub fn unknown_schema(schema: &str) -> Self {
        Error::UnknownSchema {
            schema: schema.to_string(),
        }
    }

    /// Wraps an error raised while binding row `row` of `schema`.
    pub fn binding(schema: &str, row: usize, source: Error) -> Self {
        let msg = match source {
            Error::Custom(msg) | Error::Message(msg) => msg,
            other => other.to_string(),
        };
        Error::Binding {
            schema: schema.to_string(),
            row,
            msg,
        }
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_mtcsv::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns `true` for errors detected while validating configuration.
    #[must_use]
    pub const fn is_config_conflict(&self) -> bool {
        matches!(self, Error::ConfigConflict { .. })
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
