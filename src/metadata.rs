//! Metadata overlay.
//!
//! Metadata rows look like value rows but carry a caller-declared prefix:
//!
//! ```text
//! Notes,Fruit,"alice","ripe in june"
//! ```
//!
//! Nothing about metadata is inferred from the document. A
//! [`MetadataDeclaration`] names the prefix, the schema it decorates, the
//! [`MetadataKind`] and the ordered property names its fields bind to.
//!
//! | Kind              | Materialized as                                   | Scope         |
//! |-------------------|---------------------------------------------------|---------------|
//! | `Mapping`         | name -> text, empty field is `""`                 | per instance  |
//! | `NullableMapping` | name -> text, empty field is absent (`None`)      | per instance  |
//! | `Structured`      | raw fields bound later to a record type           | per instance  |
//! | `Tag`             | like `Structured`                                 | per schema    |
//!
//! A field written as exactly `""` is always the empty string.

use crate::classify::{classify, Lines};
use crate::convert::Conversions;
use crate::de::struct_fields;
use crate::sequence::SequenceTracker;
use crate::token::unquote;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// How the fields of a metadata row are materialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataKind {
    Mapping,
    NullableMapping,
    Structured,
    Tag,
}

/// Whether metadata decorates each row's schema instance or the schema itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataScope {
    PerInstance,
    PerSchema,
}

impl MetadataKind {
    #[must_use]
    pub const fn scope(&self) -> MetadataScope {
        match self {
            MetadataKind::Tag => MetadataScope::PerSchema,
            _ => MetadataScope::PerInstance,
        }
    }

    #[must_use]
    pub const fn is_mapping(&self) -> bool {
        matches!(self, MetadataKind::Mapping | MetadataKind::NullableMapping)
    }
}

/// A caller-supplied description of one metadata prefix.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
/// use serde_mtcsv::{MetadataDeclaration, MetadataKind, MetadataScope};
///
/// #[derive(Deserialize)]
/// struct Origin {
///     country: String,
///     region: String,
/// }
///
/// let notes = MetadataDeclaration::nullable_mapping("Notes", "Fruit", ["Author", "Text"]);
/// assert_eq!(notes.kind, MetadataKind::NullableMapping);
///
/// let origin = MetadataDeclaration::tag("Origin", "Fruit", "Origin", ["country", "region"])
///     .bound_to::<Origin>();
/// assert_eq!(origin.kind.scope(), MetadataScope::PerSchema);
/// assert_eq!(origin.known_fields, Some(&["country", "region"][..]));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDeclaration {
    pub prefix: String,
    pub schema: String,
    pub kind: MetadataKind,
    pub properties: Vec<String>,
    /// Name of the record type structured metadata binds to.
    #[serde(default)]
    pub record_type: Option<String>,
    /// Field names of the bound record type, checked during validation.
    #[serde(skip)]
    pub known_fields: Option<&'static [&'static str]>,
}

impl MetadataDeclaration {
    fn new<I, S>(prefix: &str, schema: &str, kind: MetadataKind, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MetadataDeclaration {
            prefix: prefix.to_string(),
            schema: schema.to_string(),
            kind,
            properties: properties.into_iter().map(Into::into).collect(),
            record_type: None,
            known_fields: None,
        }
    }

    /// Key/value metadata where an empty field yields an empty string.
    pub fn mapping<I, S>(prefix: &str, schema: &str, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(prefix, schema, MetadataKind::Mapping, properties)
    }

    /// Key/value metadata where an empty field is absent.
    pub fn nullable_mapping<I, S>(prefix: &str, schema: &str, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(prefix, schema, MetadataKind::NullableMapping, properties)
    }

    /// Metadata rows bound to fields of `record_type`.
    pub fn structured<I, S>(prefix: &str, schema: &str, record_type: &str, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut declaration = Self::new(prefix, schema, MetadataKind::Structured, properties);
        declaration.record_type = Some(record_type.to_string());
        declaration
    }

    /// Structured metadata that decorates the schema as a whole.
    pub fn tag<I, S>(prefix: &str, schema: &str, record_type: &str, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut declaration = Self::new(prefix, schema, MetadataKind::Tag, properties);
        declaration.record_type = Some(record_type.to_string());
        declaration
    }

    /// Records the field names of `T` so validation can reject unknown properties.
    #[must_use]
    pub fn bound_to<T>(mut self) -> Self
    where
        T: for<'de> Deserialize<'de>,
    {
        self.known_fields = struct_fields::<T>();
        self
    }

    /// The counter namespace used for placeholders inside structured rows.
    #[must_use]
    pub fn sequence_key(&self) -> &str {
        self.record_type.as_deref().unwrap_or(&self.prefix)
    }
}

/// Fails with a configuration conflict when a declared property is not a field of the record type.
pub(crate) fn check_known_fields<'a, I>(
    properties: I,
    known: &[&str],
    prefix: &str,
    schema: &str,
    record_type: Option<&str>,
) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    match properties.into_iter().find(|name| !known.contains(name)) {
        Some(missing) => Err(Error::schema_conflict(
            prefix,
            schema,
            &format!(
                "field '{}' is not defined on record type '{}'",
                missing,
                record_type.unwrap_or(prefix)
            ),
        )),
        None => Ok(()),
    }
}

/// One materialized metadata row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MetadataRecord {
    Mapping {
        prefix: String,
        entries: IndexMap<String, Option<String>>,
    },
    Structured {
        prefix: String,
        record_type: Option<String>,
        scope: MetadataScope,
        fields: IndexMap<String, String>,
    },
}

impl MetadataRecord {
    #[must_use]
    pub fn prefix(&self) -> &str {
        match self {
            MetadataRecord::Mapping { prefix, .. } | MetadataRecord::Structured { prefix, .. } => {
                prefix
            }
        }
    }

    #[must_use]
    pub fn scope(&self) -> MetadataScope {
        match self {
            MetadataRecord::Mapping { .. } => MetadataScope::PerInstance,
            MetadataRecord::Structured { scope, .. } => *scope,
        }
    }

    /// Looks a value up by property name. Absent nullable entries yield `None`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        match self {
            MetadataRecord::Mapping { entries, .. } => entries.get(name)?.as_deref(),
            MetadataRecord::Structured { fields, .. } => fields.get(name).map(String::as_str),
        }
    }
}

/// Run-scoped inputs shared by every declaration of one parse.
pub struct Overlay<'a> {
    pub lines: &'a Lines,
    pub conversions: &'a Conversions,
    pub sequences: &'a mut SequenceTracker,
}

impl Overlay<'_> {
    /// Materializes the metadata of every declaration in `declarations` for `schema`.
    ///
    /// Records come out in declaration order, then row order.
    pub fn attach(
        &mut self,
        schema: &str,
        declarations: &[MetadataDeclaration],
    ) -> Vec<MetadataRecord> {
        let mut records = Vec::new();
        for declaration in declarations.iter().filter(|d| d.schema == schema) {
            let rows = classify(self.lines, &[&declaration.prefix], Some(schema));
            trace!(
                %schema,
                prefix = %declaration.prefix,
                rows = rows.len(),
                "attaching metadata"
            );
            for row in rows {
                records.push(self.materialize(declaration, row));
            }
        }
        records
    }

    fn materialize(&mut self, declaration: &MetadataDeclaration, row: Vec<String>) -> MetadataRecord {
        let prefix = declaration.prefix.clone();
        if declaration.kind.is_mapping() {
            let nullable = declaration.kind == MetadataKind::NullableMapping;
            let entries = declaration
                .properties
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let raw = row.get(i).map(String::as_str).unwrap_or("");
                    (name.clone(), self.mapping_value(raw, nullable))
                })
                .collect();
            return MetadataRecord::Mapping { prefix, entries };
        }

        let key = declaration.sequence_key().to_string();
        let fields = declaration
            .properties
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let raw = row.get(i).map(String::as_str).unwrap_or("");
                let field = if self.sequences.is_placeholder(raw) {
                    self.sequences.assign(&key, raw)
                } else {
                    self.conversions.convert_value(raw)
                };
                (name.clone(), field)
            })
            .collect();
        MetadataRecord::Structured {
            prefix,
            record_type: declaration.record_type.clone(),
            scope: declaration.kind.scope(),
            fields,
        }
    }

    fn mapping_value(&self, raw: &str, nullable: bool) -> Option<String> {
        if raw == "\"\"" {
            return Some(String::new());
        }
        if raw.is_empty() {
            return if nullable { None } else { Some(String::new()) };
        }
        let converted = self.conversions.convert_value(raw);
        Some(unquote(&converted).to_string())
    }
}
