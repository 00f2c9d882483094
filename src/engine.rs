//! The parse pipeline.
//!
//! One call to [`Engine::parse`] walks a fixed sequence of states:
//!
//! ```text
//! Idle -> ConfigExtracted -> PrefixesResolved -> SchemasMaterialized -> ReferencesResolved -> Done
//! ```
//!
//! 1. **ConfigExtracted**: comments are dropped, `GlobalConfig` / `TypedConfig`
//!    entries and both conversion tables are collected.
//! 2. **PrefixesResolved**: every schema named in the document gets its
//!    effective property and value prefix and reference columns; prefix
//!    conflicts are fatal here, before any row is touched.
//! 3. **SchemasMaterialized**: property blocks and value rows become
//!    [`Table`]s (placeholders numbered, values converted, arity fixed up) and
//!    metadata rows become [`MetadataRecord`]s.
//! 4. **ReferencesResolved**: `#Schema(Name)` fields are rewritten across all tables.
//!
//! All run state (counters, tables, metadata) is created inside the call and
//! dropped or returned at the end, so an [`Engine`] can be reused freely.

use crate::classify::{classify, schema_names, Lines};
use crate::config::{ConfigTable, ReferenceColumns, Resolver};
use crate::convert::{ConversionTable, Conversions};
use crate::de::{from_row_with_codec, struct_fields};
use crate::map::SchemaMap;
use crate::metadata::{check_known_fields, MetadataRecord, MetadataScope, Overlay};
use crate::reference::resolve_references;
use crate::scalar::{DefaultCodec, ScalarCodec};
use crate::ser::Writer;
use crate::sequence::SequenceTracker;
use crate::token::unquote;
use crate::{Error, ParseOptions, Result};
use indexmap::{IndexMap, IndexSet};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, debug_span, trace};

/// The typeless rows of one schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Name the table is stored under (after type conversion).
    pub name: String,
    /// Name the schema has in the document.
    pub source: String,
    pub properties: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub reference: ReferenceColumns,
}

impl Table {
    #[must_use]
    pub fn column_index(&self, property: &str) -> Option<usize> {
        self.properties.iter().position(|name| name == property)
    }

    /// Raw field of `row` under `property`.
    #[must_use]
    pub fn get(&self, row: usize, property: &str) -> Option<&str> {
        let column = self.column_index(property)?;
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// All raw fields of one column, in row order.
    #[must_use]
    pub fn column(&self, property: &str) -> Option<Vec<&str>> {
        let column = self.column_index(property)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(column).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The result of a parse: typeless tables plus metadata, both keyed by stored schema name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub tables: SchemaMap<Table>,
    pub metadata: SchemaMap<Vec<MetadataRecord>>,
}

/// Property names and rows of one schema.
pub type TypelessTable = (Vec<String>, Vec<Vec<String>>);

impl Document {
    #[must_use]
    pub fn table(&self, schema: &str) -> Option<&Table> {
        self.tables.get(schema)
    }

    /// All metadata records of `schema`, in declaration then row order.
    #[must_use]
    pub fn metadata(&self, schema: &str) -> &[MetadataRecord] {
        self.metadata.get(schema).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Metadata meant for the schema's instances.
    pub fn instance_metadata<'a>(
        &'a self,
        schema: &str,
    ) -> impl Iterator<Item = &'a MetadataRecord> + 'a {
        self.metadata_in_scope(schema, MetadataScope::PerInstance)
    }

    /// Metadata meant for the schema itself (tags).
    pub fn schema_tags<'a>(&'a self, schema: &str) -> impl Iterator<Item = &'a MetadataRecord> + 'a {
        self.metadata_in_scope(schema, MetadataScope::PerSchema)
    }

    fn metadata_in_scope<'a>(
        &'a self,
        schema: &str,
        scope: MetadataScope,
    ) -> impl Iterator<Item = &'a MetadataRecord> + 'a {
        self.metadata(schema)
            .iter()
            .filter(move |record| record.scope() == scope)
    }

    /// Splits the document into plain schema -> (names, rows) and schema -> metadata maps.
    #[must_use]
    pub fn into_typeless(
        self,
    ) -> (
        IndexMap<String, TypelessTable>,
        IndexMap<String, Vec<MetadataRecord>>,
    ) {
        let tables = self
            .tables
            .into_iter()
            .map(|(schema, table)| (schema, (table.properties, table.rows)))
            .collect();
        (tables, self.metadata.into())
    }

    /// Binds every row of `schema` to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSchema`] if the document has no such schema and
    /// [`Error::Binding`] if a row cannot be coerced into `T`.
    pub fn bind<T>(&self, schema: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.bind_with_codec(schema, &DefaultCodec)
    }

    /// Like [`Document::bind`], with a caller-supplied scalar codec.
    pub fn bind_with_codec<T, C>(&self, schema: &str, codec: &C) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        C: ScalarCodec,
    {
        let table = self
            .tables
            .get(schema)
            .ok_or_else(|| Error::unknown_schema(schema))?;
        table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                from_row_with_codec(&table.properties, row, codec)
                    .map_err(|e| Error::binding(schema, i, e))
            })
            .collect()
    }

    /// Binds the structured or tag metadata of `schema` carrying `prefix` to `T`.
    ///
    /// Mapping records under the same prefix are bound from their entries, with
    /// absent values left empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigConflict`] if a structured record carries a
    /// property that `T` has no field for, and [`Error::Binding`] if a record
    /// cannot be coerced into `T`.
    pub fn bind_metadata<T>(&self, schema: &str, prefix: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let known = struct_fields::<T>();
        self.metadata(schema)
            .iter()
            .filter(|record| record.prefix() == prefix)
            .enumerate()
            .map(|(i, record)| {
                let (names, fields): (Vec<String>, Vec<String>) = match record {
                    MetadataRecord::Structured {
                        fields,
                        record_type,
                        ..
                    } => {
                        if let Some(known) = known {
                            check_known_fields(
                                fields.keys().map(String::as_str),
                                known,
                                prefix,
                                schema,
                                record_type.as_deref(),
                            )?;
                        }
                        fields
                            .iter()
                            .map(|(name, field)| (name.clone(), field.clone()))
                            .unzip()
                    }
                    MetadataRecord::Mapping { entries, .. } => entries
                        .iter()
                        .map(|(name, value)| {
                            let field = value
                                .as_ref()
                                .map(|v| format!("\"{}\"", v))
                                .unwrap_or_default();
                            (name.clone(), field)
                        })
                        .unzip(),
                };
                from_row_with_codec(&names, &fields, &DefaultCodec)
                    .map_err(|e| Error::binding(schema, i, e))
            })
            .collect()
    }
}

impl fmt::Display for Document {
    /// Writes the document back with the default prefixes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut writer = Writer::new(&ParseOptions::default());
        writer.write_document(self);
        f.write_str(&writer.into_inner())
    }
}

/// Where a parse run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParseState {
    Idle,
    ConfigExtracted,
    PrefixesResolved,
    SchemasMaterialized,
    ReferencesResolved,
    Done,
}

/// Effective configuration of one schema for the current run.
#[derive(Debug, Clone, PartialEq)]
struct SchemaPlan {
    source: String,
    property_prefix: String,
    value_prefix: String,
    reference: ReferenceColumns,
}

/// A validated configuration that can parse any number of documents.
///
/// # Examples
///
/// ```rust
/// use serde_mtcsv::{Engine, ParseOptions};
///
/// let engine = Engine::new(ParseOptions::default()).unwrap();
/// let document = engine
///     .parse("Properties,Foo,Id,Name\r\nValues,Foo,#,\"A\"\r\nValues,Foo,#,\"B\"")
///     .unwrap();
///
/// let foo = document.table("Foo").unwrap();
/// assert_eq!(foo.column("Id"), Some(vec!["1", "2"]));
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    options: ParseOptions,
}

impl Engine {
    /// Validates `options` and builds an engine around them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigConflict`] if the options are inconsistent.
    pub fn new(options: ParseOptions) -> Result<Self> {
        options.validate()?;
        Ok(Engine { options })
    }

    #[must_use]
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parses `input` into a [`Document`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigConflict`] if document-level configuration makes
    /// prefixes collide, [`Error::MissingSchemaDefinition`] for value rows
    /// without a property block and [`Error::DuplicateSchemaDefinition`] for
    /// repeated property blocks.
    pub fn parse(&self, input: &str) -> Result<Document> {
        let span = debug_span!("parse", bytes = input.len());
        let _guard = span.enter();

        let mut run = Run::new(&self.options, input);
        run.extract_config();
        run.resolve_prefixes()?;
        run.materialize()?;
        run.resolve_references();
        Ok(run.finish())
    }
}

/// State of one parse call.
struct Run<'a> {
    options: &'a ParseOptions,
    state: ParseState,
    lines: Lines,
    config: ConfigTable,
    conversions: Conversions,
    plans: Vec<SchemaPlan>,
    sequences: SequenceTracker,
    document: Document,
}

impl<'a> Run<'a> {
    fn new(options: &'a ParseOptions, input: &str) -> Self {
        Run {
            options,
            state: ParseState::Idle,
            lines: Lines::parse(input, &options.comment_prefixes),
            config: ConfigTable::new(),
            conversions: Conversions::default(),
            plans: Vec::new(),
            sequences: SequenceTracker::new(options.placeholder.as_str()),
            document: Document::default(),
        }
    }

    fn advance(&mut self, next: ParseState) {
        debug_assert!(next > self.state, "parse states only move forward");
        debug!(from = ?self.state, to = ?next, "parse state");
        self.state = next;
    }

    fn extract_config(&mut self) {
        self.config = ConfigTable::extract(&self.lines, self.options);
        let resolver = Resolver::new(self.options, &self.config);
        let conversions = Conversions {
            types: ConversionTable::extract(
                &self.lines,
                resolver.conversion_type_prefix(),
                self.options.type_conversion,
            ),
            values: ConversionTable::extract(
                &self.lines,
                resolver.conversion_value_prefix(),
                self.options.value_conversion,
            ),
        };
        debug!(
            lines = self.lines.len(),
            type_conversions = conversions.types.len(),
            value_conversions = conversions.values.len(),
            "configuration extracted"
        );
        self.conversions = conversions;
        self.advance(ParseState::ConfigExtracted);
    }

    fn resolve_prefixes(&mut self) -> Result<()> {
        let resolver = Resolver::new(self.options, &self.config);
        let reserved = [
            self.options.global_config_prefix.as_str(),
            self.options.typed_config_prefix.as_str(),
            resolver.conversion_type_prefix(),
            resolver.conversion_value_prefix(),
        ];

        for declaration in &self.options.metadata {
            if reserved.contains(&declaration.prefix.as_str()) {
                return Err(Error::schema_conflict(
                    &declaration.prefix,
                    &declaration.schema,
                    "metadata prefix collides with a configuration prefix",
                ));
            }
        }

        let mut plans = Vec::new();
        for source in schema_names(&self.lines, &reserved) {
            let plan = SchemaPlan {
                property_prefix: resolver.property_prefix(&source).to_string(),
                value_prefix: resolver.value_prefix(&source).to_string(),
                reference: resolver.reference_columns(&source),
                source,
            };
            check_plan(&plan, self.options)?;
            trace!(
                schema = %plan.source,
                property_prefix = %plan.property_prefix,
                value_prefix = %plan.value_prefix,
                "resolved prefixes"
            );
            plans.push(plan);
        }

        self.plans = plans;
        self.advance(ParseState::PrefixesResolved);
        Ok(())
    }

    fn materialize(&mut self) -> Result<()> {
        self.sequences
            .initialize(self.plans.iter().map(|plan| plan.source.as_str()));
        self.sequences.initialize(
            self.options
                .metadata
                .iter()
                .map(|declaration| declaration.sequence_key()),
        );

        let plans = std::mem::take(&mut self.plans);
        for plan in &plans {
            let Some(table) = self.materialize_table(plan)? else {
                continue;
            };
            if self.document.tables.contains_key(&table.name) {
                return Err(Error::duplicate_schema(&table.name));
            }
            trace!(schema = %table.name, rows = table.len(), "materialized table");
            self.document.tables.insert(table.name.clone(), table);
        }
        self.plans = plans;

        let declared: IndexSet<&str> = self
            .options
            .metadata
            .iter()
            .map(|declaration| declaration.schema.as_str())
            .collect();
        let mut overlay = Overlay {
            lines: &self.lines,
            conversions: &self.conversions,
            sequences: &mut self.sequences,
        };
        for schema in declared {
            let records = overlay.attach(schema, &self.options.metadata);
            if records.is_empty() {
                continue;
            }
            let key = self.conversions.convert_type(schema).to_string();
            self.document
                .metadata
                .entry_or_default(&key)
                .extend(records);
        }

        debug!(
            tables = self.document.tables.len(),
            metadata = self.document.metadata.len(),
            "schemas materialized"
        );
        self.advance(ParseState::SchemasMaterialized);
        Ok(())
    }

    fn materialize_table(&mut self, plan: &SchemaPlan) -> Result<Option<Table>> {
        let mut blocks = classify(&self.lines, &[&plan.property_prefix], Some(&plan.source));
        let rows = classify(&self.lines, &[&plan.value_prefix], Some(&plan.source));

        let properties: Vec<String> = match blocks.len() {
            0 if rows.is_empty() => return Ok(None),
            0 => return Err(Error::missing_schema(&plan.source)),
            1 => blocks
                .remove(0)
                .iter()
                .map(|name| unquote(name).to_string())
                .collect(),
            _ => return Err(Error::duplicate_schema(&plan.source)),
        };

        let arity = properties.len();
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .enumerate()
            .map(|(i, mut row)| {
                if row.len() != arity {
                    trace!(
                        schema = %plan.source,
                        row = i,
                        found = row.len(),
                        expected = arity,
                        "fixing row arity"
                    );
                    row.resize(arity, String::new());
                }
                row.into_iter()
                    .map(|field| self.materialize_field(&plan.source, &field))
                    .collect::<Vec<String>>()
            })
            .collect();

        Ok(Some(Table {
            name: self.conversions.convert_type(&plan.source).to_string(),
            source: plan.source.clone(),
            properties,
            rows,
            reference: plan.reference.clone(),
        }))
    }

    fn materialize_field(&mut self, schema: &str, field: &str) -> String {
        if self.sequences.is_placeholder(field) {
            self.sequences.assign(schema, field)
        } else {
            self.conversions.convert_value(field)
        }
    }

    fn resolve_references(&mut self) {
        resolve_references(&mut self.document.tables, &self.conversions);
        self.advance(ParseState::ReferencesResolved);
    }

    fn finish(mut self) -> Document {
        self.advance(ParseState::Done);
        self.document
    }
}

fn check_plan(plan: &SchemaPlan, options: &ParseOptions) -> Result<()> {
    if plan.property_prefix == plan.value_prefix {
        return Err(Error::schema_conflict(
            &plan.value_prefix,
            &plan.source,
            "property prefix and value prefix must differ",
        ));
    }
    for declaration in &options.metadata {
        if declaration.prefix == plan.property_prefix || declaration.prefix == plan.value_prefix {
            return Err(Error::schema_conflict(
                &declaration.prefix,
                &plan.source,
                "metadata prefix collides with the property or value prefix",
            ));
        }
    }
    Ok(())
}
