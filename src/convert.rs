//! Rename tables for schema names and field values.
//!
//! ```text
//! ConversionType,<Original>,<Converted>
//! ConversionValue,<Original>,<Converted>
//! ```
//!
//! Each table is the identity unless its feature flag is enabled. Lookups are
//! exact-match and the first entry for an original wins.

use crate::classify::{classify, Lines};
use crate::token::{is_quoted, unquote};
use tracing::trace;

/// One exact-match rename table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionTable {
    enabled: bool,
    entries: Vec<(String, String)>,
}

impl ConversionTable {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        ConversionTable {
            enabled,
            entries: Vec::new(),
        }
    }

    /// Builds a table from the lines carrying `prefix`.
    pub fn extract(lines: &Lines, prefix: &str, enabled: bool) -> Self {
        let mut table = ConversionTable::new(enabled);
        for fields in classify(lines, &[prefix], None) {
            match fields.as_slice() {
                [original, converted, ..] => table.push(unquote(original), unquote(converted)),
                _ => trace!(%prefix, ?fields, "ignoring short conversion line"),
            }
        }
        table
    }

    pub fn push(&mut self, original: impl Into<String>, converted: impl Into<String>) {
        self.entries.push((original.into(), converted.into()));
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks `original` up regardless of the feature flag.
    #[must_use]
    pub fn lookup(&self, original: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(from, _)| from == original)
            .map(|(_, to)| to.as_str())
    }

    /// Applies the table when enabled; unmatched input passes through.
    ///
    /// ```rust
    /// use serde_mtcsv::convert::ConversionTable;
    ///
    /// let mut table = ConversionTable::new(true);
    /// table.push("Bread", "Loaf");
    /// assert_eq!(table.convert("Bread"), "Loaf");
    /// assert_eq!(table.convert("Butter"), "Butter");
    ///
    /// let mut disabled = ConversionTable::new(false);
    /// disabled.push("Bread", "Loaf");
    /// assert_eq!(disabled.convert("Bread"), "Bread");
    /// ```
    #[must_use]
    pub fn convert<'a>(&'a self, original: &'a str) -> &'a str {
        if !self.enabled {
            return original;
        }
        self.lookup(original).unwrap_or(original)
    }

    /// Converts a raw field, comparing its unquoted text and keeping its quoting.
    #[must_use]
    pub fn convert_field(&self, field: &str) -> String {
        if !self.enabled {
            return field.to_string();
        }
        if is_quoted(field) {
            format!("\"{}\"", self.convert(unquote(field)))
        } else {
            self.convert(field).to_string()
        }
    }
}

/// The type and value tables of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversions {
    pub types: ConversionTable,
    pub values: ConversionTable,
}

impl Conversions {
    #[must_use]
    pub fn convert_type<'a>(&'a self, name: &'a str) -> &'a str {
        self.types.convert(name)
    }

    #[must_use]
    pub fn convert_value(&self, field: &str) -> String {
        self.values.convert_field(field)
    }
}
