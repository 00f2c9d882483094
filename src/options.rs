//! Caller-side configuration for the record engine.
//!
//! [`ParseOptions`] carries everything the engine is told before it sees a
//! document: which prefixes mark which lines, whether the conversion tables
//! are applied, the reference column defaults and the metadata declarations.
//! Documents may still override prefixes and reference columns through
//! `GlobalConfig` / `TypedConfig` lines.
//!
//! ## Examples
//!
//! ```rust
//! use serde_mtcsv::{MetadataDeclaration, ParseOptions, ReferenceDefaults};
//!
//! let options = ParseOptions::new()
//!     .with_value_prefix("Rows")
//!     .with_value_conversion(true)
//!     .with_reference_defaults(ReferenceDefaults::new("Key", "Label").for_schema("Color"))
//!     .with_metadata(MetadataDeclaration::mapping("Notes", "Color", ["Author", "Text"]));
//!
//! assert_eq!(options.value_prefix, "Rows");
//! assert!(options.validate().is_ok());
//! ```

use crate::metadata::{check_known_fields, MetadataDeclaration, MetadataKind};
use crate::{Error, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROPERTY_PREFIX: &str = "Properties";
pub const DEFAULT_VALUE_PREFIX: &str = "Values";
pub const DEFAULT_GLOBAL_CONFIG_PREFIX: &str = "GlobalConfig";
pub const DEFAULT_TYPED_CONFIG_PREFIX: &str = "TypedConfig";
pub const DEFAULT_CONVERSION_TYPE_PREFIX: &str = "ConversionType";
pub const DEFAULT_CONVERSION_VALUE_PREFIX: &str = "ConversionValue";
pub const DEFAULT_ID_COLUMN: &str = "Id";
pub const DEFAULT_NAME_COLUMN: &str = "Name";
pub const DEFAULT_PLACEHOLDER: &str = "#";
pub const DEFAULT_COMMENT_PREFIXES: [&str; 5] = ["!", "#", ";", "//", "--"];

/// Caller-declared reference columns, either for one schema or for all of them.
///
/// # Examples
///
/// ```rust
/// use serde_mtcsv::ReferenceDefaults;
///
/// let everywhere = ReferenceDefaults::new("Code", "Title");
/// assert!(everywhere.schema.is_none());
///
/// let colors = ReferenceDefaults::new("Key", "Label").for_schema("Color");
/// assert_eq!(colors.schema.as_deref(), Some("Color"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDefaults {
    #[serde(default)]
    pub schema: Option<String>,
    pub id_column: String,
    pub name_column: String,
}

impl ReferenceDefaults {
    #[must_use]
    pub fn new(id_column: impl Into<String>, name_column: impl Into<String>) -> Self {
        ReferenceDefaults {
            schema: None,
            id_column: id_column.into(),
            name_column: name_column.into(),
        }
    }

    /// Narrows these defaults to one schema.
    #[must_use]
    pub fn for_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// Configuration options for parsing and writing documents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub comment_prefixes: Vec<String>,
    pub property_prefix: String,
    pub value_prefix: String,
    pub global_config_prefix: String,
    pub typed_config_prefix: String,
    pub conversion_type_prefix: String,
    pub conversion_value_prefix: String,
    pub placeholder: String,
    pub type_conversion: bool,
    pub value_conversion: bool,
    pub references: Vec<ReferenceDefaults>,
    pub metadata: Vec<MetadataDeclaration>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            comment_prefixes: DEFAULT_COMMENT_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            property_prefix: DEFAULT_PROPERTY_PREFIX.to_string(),
            value_prefix: DEFAULT_VALUE_PREFIX.to_string(),
            global_config_prefix: DEFAULT_GLOBAL_CONFIG_PREFIX.to_string(),
            typed_config_prefix: DEFAULT_TYPED_CONFIG_PREFIX.to_string(),
            conversion_type_prefix: DEFAULT_CONVERSION_TYPE_PREFIX.to_string(),
            conversion_value_prefix: DEFAULT_CONVERSION_VALUE_PREFIX.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            type_conversion: false,
            value_conversion: false,
            references: Vec::new(),
            metadata: Vec::new(),
        }
    }
}

impl ParseOptions {
    /// Creates default options.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_mtcsv::ParseOptions;
    ///
    /// let options = ParseOptions::new();
    /// assert_eq!(options.property_prefix, "Properties");
    /// assert_eq!(options.value_prefix, "Values");
    /// assert!(!options.value_conversion);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_property_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.property_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_value_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.value_prefix = prefix.into();
        self
    }

    /// Replaces the set of comment prefixes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_mtcsv::ParseOptions;
    ///
    /// let options = ParseOptions::new().with_comment_prefixes(["%"]);
    /// assert_eq!(options.comment_prefixes, vec!["%".to_string()]);
    /// ```
    #[must_use]
    pub fn with_comment_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.comment_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_conversion_prefixes(
        mut self,
        type_prefix: impl Into<String>,
        value_prefix: impl Into<String>,
    ) -> Self {
        self.conversion_type_prefix = type_prefix.into();
        self.conversion_value_prefix = value_prefix.into();
        self
    }

    /// Sets the token that stands for "next sequence value".
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Enables or disables schema-name conversion (`ConversionType` lines).
    #[must_use]
    pub fn with_type_conversion(mut self, enabled: bool) -> Self {
        self.type_conversion = enabled;
        self
    }

    /// Enables or disables value conversion (`ConversionValue` lines).
    #[must_use]
    pub fn with_value_conversion(mut self, enabled: bool) -> Self {
        self.value_conversion = enabled;
        self
    }

    #[must_use]
    pub fn with_reference_defaults(mut self, defaults: ReferenceDefaults) -> Self {
        self.references.push(defaults);
        self
    }

    /// Appends a metadata declaration. Declaration order is kept in the output.
    #[must_use]
    pub fn with_metadata(mut self, declaration: MetadataDeclaration) -> Self {
        self.metadata.push(declaration);
        self
    }

    /// Prefixes that can never name a metadata declaration.
    pub(crate) fn reserved_prefixes(&self) -> [&str; 4] {
        [
            self.global_config_prefix.as_str(),
            self.typed_config_prefix.as_str(),
            self.conversion_type_prefix.as_str(),
            self.conversion_value_prefix.as_str(),
        ]
    }

    /// Checks the options for conflicts that would make lines ambiguous.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigConflict`] when the property and value prefixes
    /// are equal, when a metadata prefix repeats or collides with a data or
    /// configuration prefix, or when a structured declaration names a field its
    /// bound record type does not have.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_mtcsv::ParseOptions;
    ///
    /// let options = ParseOptions::new().with_value_prefix("Properties");
    /// assert!(options.validate().unwrap_err().is_config_conflict());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.property_prefix == self.value_prefix {
            return Err(Error::config_conflict(
                &self.value_prefix,
                "property prefix and value prefix must differ",
            ));
        }

        let mut seen = IndexSet::new();
        for declaration in &self.metadata {
            let prefix = declaration.prefix.as_str();
            if prefix.is_empty() {
                return Err(Error::schema_conflict(
                    prefix,
                    &declaration.schema,
                    "metadata prefix must not be empty",
                ));
            }
            if !seen.insert(prefix) {
                return Err(Error::schema_conflict(
                    prefix,
                    &declaration.schema,
                    "metadata prefix is declared more than once",
                ));
            }
            if prefix == self.property_prefix || prefix == self.value_prefix {
                return Err(Error::schema_conflict(
                    prefix,
                    &declaration.schema,
                    "metadata prefix collides with the property or value prefix",
                ));
            }
            if self.reserved_prefixes().contains(&prefix) {
                return Err(Error::schema_conflict(
                    prefix,
                    &declaration.schema,
                    "metadata prefix collides with a configuration prefix",
                ));
            }
            validate_known_fields(declaration)?;
        }

        Ok(())
    }
}

fn validate_known_fields(declaration: &MetadataDeclaration) -> Result<()> {
    if matches!(
        declaration.kind,
        MetadataKind::Mapping | MetadataKind::NullableMapping
    ) {
        return Ok(());
    }
    let Some(fields) = declaration.known_fields else {
        return Ok(());
    };
    check_known_fields(
        declaration.properties.iter().map(String::as_str),
        fields,
        &declaration.prefix,
        &declaration.schema,
        declaration.record_type.as_deref(),
    )
}
