//! Document-level configuration and per-schema resolution.
//!
//! Documents may override the caller's prefixes and reference columns with
//! two kinds of lines:
//!
//! ```text
//! GlobalConfig,<Key>,<Value>
//! TypedConfig,<Schema>,<Key>,<Value>
//! ```
//!
//! Only the keys of [`ConfigKey`] are honored; anything else is ignored.
//! A [`Resolver`] answers per-schema questions with the first hit of:
//! typed entry, global entry, caller defaults for the schema, caller defaults
//! for every schema, built-in default.

use crate::classify::{classify, Lines};
use crate::options::{
    ParseOptions, ReferenceDefaults, DEFAULT_ID_COLUMN, DEFAULT_NAME_COLUMN,
};
use crate::token::unquote;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// The configuration keys a document may set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    PropertyPrefix,
    ValuesPrefix,
    ReferenceIdColumnName,
    ReferenceNameColumnName,
    ConversionTypePrefix,
    ConversionValuePrefix,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 6] = [
        ConfigKey::PropertyPrefix,
        ConfigKey::ValuesPrefix,
        ConfigKey::ReferenceIdColumnName,
        ConfigKey::ReferenceNameColumnName,
        ConfigKey::ConversionTypePrefix,
        ConfigKey::ConversionValuePrefix,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::PropertyPrefix => "PropertyPrefix",
            ConfigKey::ValuesPrefix => "ValuesPrefix",
            ConfigKey::ReferenceIdColumnName => "ReferenceIdColumnName",
            ConfigKey::ReferenceNameColumnName => "ReferenceNameColumnName",
            ConfigKey::ConversionTypePrefix => "ConversionTypePrefix",
            ConfigKey::ConversionValuePrefix => "ConversionValuePrefix",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a configuration key is not one of [`ConfigKey::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey(pub String);

impl FromStr for ConfigKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// The `GlobalConfig` and `TypedConfig` entries of one document.
///
/// The first entry for a key wins; later duplicates are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTable {
    global: IndexMap<ConfigKey, String>,
    typed: IndexMap<String, IndexMap<ConfigKey, String>>,
}

impl ConfigTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the configuration lines of `lines`.
    ///
    /// ```rust
    /// use serde_mtcsv::classify::Lines;
    /// use serde_mtcsv::config::{ConfigKey, ConfigTable};
    /// use serde_mtcsv::ParseOptions;
    ///
    /// let lines = Lines::parse(
    ///     "GlobalConfig,ValuesPrefix,Rows\nTypedConfig,Foo,ValuesPrefix,FooRows\nGlobalConfig,Colour,Red",
    ///     &["!"],
    /// );
    /// let table = ConfigTable::extract(&lines, &ParseOptions::default());
    /// assert_eq!(table.global(ConfigKey::ValuesPrefix), Some("Rows"));
    /// assert_eq!(table.typed("Foo", ConfigKey::ValuesPrefix), Some("FooRows"));
    /// ```
    pub fn extract(lines: &Lines, options: &ParseOptions) -> Self {
        let mut table = ConfigTable::new();

        for fields in classify(lines, &[&options.global_config_prefix], None) {
            match fields.as_slice() {
                [key, value, ..] => match key.parse::<ConfigKey>() {
                    Ok(key) => table.set_global(key, unquote(value)),
                    Err(UnknownKey(key)) => trace!(%key, "ignoring unknown global config key"),
                },
                _ => trace!(?fields, "ignoring short global config line"),
            }
        }

        for fields in classify(lines, &[&options.typed_config_prefix], None) {
            match fields.as_slice() {
                [schema, key, value, ..] => match key.parse::<ConfigKey>() {
                    Ok(key) => table.set_typed(schema, key, unquote(value)),
                    Err(UnknownKey(key)) => {
                        trace!(%schema, %key, "ignoring unknown typed config key")
                    }
                },
                _ => trace!(?fields, "ignoring short typed config line"),
            }
        }

        table
    }

    /// Records a global entry unless the key is already set.
    pub fn set_global(&mut self, key: ConfigKey, value: &str) {
        self.global
            .entry(key)
            .or_insert_with(|| value.to_string());
    }

    /// Records a typed entry unless the key is already set for `schema`.
    pub fn set_typed(&mut self, schema: &str, key: ConfigKey, value: &str) {
        self.typed
            .entry(schema.to_string())
            .or_default()
            .entry(key)
            .or_insert_with(|| value.to_string());
    }

    #[must_use]
    pub fn global(&self, key: ConfigKey) -> Option<&str> {
        self.global.get(&key).map(String::as_str)
    }

    #[must_use]
    pub fn typed(&self, schema: &str, key: ConfigKey) -> Option<&str> {
        self.typed
            .get(schema)
            .and_then(|entries| entries.get(&key))
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.typed.is_empty()
    }
}

/// Id and name column of a schema, as used by symbolic references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceColumns {
    pub id: String,
    pub name: String,
}

/// Answers per-schema configuration questions.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    options: &'a ParseOptions,
    table: &'a ConfigTable,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(options: &'a ParseOptions, table: &'a ConfigTable) -> Self {
        Resolver { options, table }
    }

    fn layered(&self, schema: &str, key: ConfigKey) -> Option<&'a str> {
        self.table
            .typed(schema, key)
            .or_else(|| self.table.global(key))
    }

    #[must_use]
    pub fn property_prefix(&self, schema: &str) -> &'a str {
        self.layered(schema, ConfigKey::PropertyPrefix)
            .unwrap_or(self.options.property_prefix.as_str())
    }

    #[must_use]
    pub fn value_prefix(&self, schema: &str) -> &'a str {
        self.layered(schema, ConfigKey::ValuesPrefix)
            .unwrap_or(self.options.value_prefix.as_str())
    }

    #[must_use]
    pub fn reference_id_column(&self, schema: &str) -> &'a str {
        self.layered(schema, ConfigKey::ReferenceIdColumnName)
            .or_else(|| self.reference_default(schema, |d| &d.id_column))
            .unwrap_or(DEFAULT_ID_COLUMN)
    }

    #[must_use]
    pub fn reference_name_column(&self, schema: &str) -> &'a str {
        self.layered(schema, ConfigKey::ReferenceNameColumnName)
            .or_else(|| self.reference_default(schema, |d| &d.name_column))
            .unwrap_or(DEFAULT_NAME_COLUMN)
    }

    #[must_use]
    pub fn reference_columns(&self, schema: &str) -> ReferenceColumns {
        ReferenceColumns {
            id: self.reference_id_column(schema).to_string(),
            name: self.reference_name_column(schema).to_string(),
        }
    }

    fn reference_default(
        &self,
        schema: &str,
        column: impl Fn(&'a ReferenceDefaults) -> &'a String,
    ) -> Option<&'a str> {
        let references = &self.options.references;
        references
            .iter()
            .find(|d| d.schema.as_deref() == Some(schema))
            .or_else(|| references.iter().find(|d| d.schema.is_none()))
            .map(|d| column(d).as_str())
    }

    /// Conversion prefixes are document-wide, so only global entries apply.
    #[must_use]
    pub fn conversion_type_prefix(&self) -> &'a str {
        self.table
            .global(ConfigKey::ConversionTypePrefix)
            .unwrap_or(self.options.conversion_type_prefix.as_str())
    }

    #[must_use]
    pub fn conversion_value_prefix(&self) -> &'a str {
        self.table
            .global(ConfigKey::ConversionValuePrefix)
            .unwrap_or(self.options.conversion_value_prefix.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(input: &str) -> ConfigTable {
        ConfigTable::extract(&Lines::parse(input, &["!"]), &ParseOptions::default())
    }

    #[test]
    fn test_key_round_trip_names() {
        for key in ConfigKey::ALL {
            assert_eq!(key.as_str().parse::<ConfigKey>(), Ok(key));
        }
        assert!("propertyprefix".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_typed_overrides_global_for_that_schema_only() {
        let table = table(
            "GlobalConfig,PropertyPrefix,Props\n\
             TypedConfig,X,PropertyPrefix,XProps",
        );
        let options = ParseOptions::default();
        let resolver = Resolver::new(&options, &table);
        assert_eq!(resolver.property_prefix("X"), "XProps");
        assert_eq!(resolver.property_prefix("Y"), "Props");
        assert_eq!(resolver.value_prefix("X"), "Values");
    }

    #[test]
    fn test_first_entry_wins() {
        let table = table("GlobalConfig,ValuesPrefix,A\nGlobalConfig,ValuesPrefix,B");
        assert_eq!(table.global(ConfigKey::ValuesPrefix), Some("A"));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let table = table("GlobalConfig,Nope,1\nTypedConfig,X,AlsoNope,2\nGlobalConfig,ValuesPrefix");
        assert!(table.is_empty());
    }

    #[test]
    fn test_reference_column_hierarchy() {
        let options = ParseOptions::new()
            .with_reference_defaults(ReferenceDefaults::new("Code", "Title"))
            .with_reference_defaults(ReferenceDefaults::new("Key", "Label").for_schema("Color"));
        let table = table("TypedConfig,Size,ReferenceIdColumnName,SizeId");
        let resolver = Resolver::new(&options, &table);

        assert_eq!(resolver.reference_id_column("Size"), "SizeId");
        assert_eq!(resolver.reference_name_column("Size"), "Title");
        assert_eq!(resolver.reference_id_column("Color"), "Key");
        assert_eq!(resolver.reference_name_column("Color"), "Label");
        assert_eq!(resolver.reference_id_column("Other"), "Code");
    }

    #[test]
    fn test_builtin_reference_defaults() {
        let options = ParseOptions::default();
        let table = ConfigTable::new();
        let resolver = Resolver::new(&options, &table);
        assert_eq!(
            resolver.reference_columns("Any"),
            ReferenceColumns {
                id: "Id".to_string(),
                name: "Name".to_string(),
            }
        );
    }

    #[test]
    fn test_conversion_prefixes_ignore_typed_entries() {
        let table = table(
            "GlobalConfig,ConversionValuePrefix,Swap\n\
             TypedConfig,X,ConversionTypePrefix,Rename",
        );
        let options = ParseOptions::default();
        let resolver = Resolver::new(&options, &table);
        assert_eq!(resolver.conversion_value_prefix(), "Swap");
        assert_eq!(resolver.conversion_type_prefix(), "ConversionType");
    }
}
