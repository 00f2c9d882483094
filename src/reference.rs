//! Symbolic cross-schema references.
//!
//! A field written as `#<Schema>(<Name>)` points at the row of `<Schema>`
//! whose name column equals `<Name>`, and is replaced by that row's id
//! column. Quotes around `<Name>` are optional. References that cannot be
//! resolved stay as literal text.
//!
//! The field itself is not quoted, so the tokenizer splits it at every comma
//! and a `<Name>` containing `,` can never be referenced.
//!
//! ```rust
//! use serde_mtcsv::reference::SymbolicReference;
//!
//! let reference = SymbolicReference::parse("#Color(\"Red\")").unwrap();
//! assert_eq!(reference.schema, "Color");
//! assert_eq!(reference.name, "Red");
//! assert!(SymbolicReference::parse("#").is_none());
//! ```

use crate::convert::Conversions;
use crate::engine::Table;
use crate::map::SchemaMap;
use crate::token::unquote;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, trace};

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^#\s*([^\s()]+)\s*\(\s*(.*?)\s*\)$").expect("reference pattern is valid")
    })
}

/// A parsed `#Schema(Name)` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolicReference<'a> {
    pub schema: &'a str,
    pub name: &'a str,
}

impl<'a> SymbolicReference<'a> {
    #[must_use]
    pub fn parse(field: &'a str) -> Option<Self> {
        let captures = pattern().captures(field.trim())?;
        let schema = captures.get(1)?.as_str();
        let name = unquote(captures.get(2)?.as_str()).trim();
        Some(SymbolicReference { schema, name })
    }
}

/// Name -> id lookup for one schema, first row wins.
type NameIndex = IndexMap<String, String>;

fn index_table(table: &Table) -> Option<NameIndex> {
    let id = table.column_index(&table.reference.id)?;
    let name = table.column_index(&table.reference.name)?;
    let mut index = NameIndex::new();
    for row in &table.rows {
        if let (Some(row_name), Some(row_id)) = (row.get(name), row.get(id)) {
            index
                .entry(unquote(row_name).to_string())
                .or_insert_with(|| row_id.clone());
        }
    }
    Some(index)
}

/// Rewrites every resolvable reference in `tables` into the referenced row's id.
///
/// Lookups see the tables as they were before this pass, so the order of
/// schemas in the document does not matter. The `<Schema>` part may use
/// either the stored (converted) schema name or the name written in the
/// document. The `<Name>` part goes through the value table before matching,
/// since the referenced rows were stored converted. Returns the number of
/// rewritten fields.
pub fn resolve_references(tables: &mut SchemaMap<Table>, conversions: &Conversions) -> usize {
    let indexes: SchemaMap<Option<NameIndex>> = tables
        .iter()
        .map(|(schema, table)| (schema.clone(), index_table(table)))
        .collect();
    let sources: IndexMap<String, String> = tables
        .iter()
        .map(|(schema, table)| (table.source.clone(), schema.clone()))
        .collect();

    let lookup = |reference: &SymbolicReference<'_>| -> Option<String> {
        let converted = conversions.convert_type(reference.schema);
        let index = match indexes.get(converted) {
            Some(index) => index,
            None => indexes.get(sources.get(reference.schema)?)?,
        };
        let name = conversions.values.convert(reference.name);
        index.as_ref()?.get(name).cloned()
    };

    let mut resolved = 0;
    for table in tables.values_mut() {
        for row in table.rows.iter_mut() {
            for field in row.iter_mut() {
                let Some(reference) = SymbolicReference::parse(field) else {
                    continue;
                };
                match lookup(&reference) {
                    Some(id) => {
                        trace!(schema = %table.name, %field, %id, "resolved reference");
                        *field = id;
                        resolved += 1;
                    }
                    None => trace!(schema = %table.name, %field, "leaving unresolved reference"),
                }
            }
        }
    }
    debug!(resolved, "reference pass finished");
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferenceColumns;
    use crate::convert::ConversionTable;
    use crate::token::split_line;

    fn table(name: &str, properties: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            name: name.to_string(),
            source: name.to_string(),
            properties: properties.iter().map(|p| p.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|f| f.to_string()).collect())
                .collect(),
            reference: ReferenceColumns {
                id: "Id".to_string(),
                name: "Name".to_string(),
            },
        }
    }

    fn tables() -> SchemaMap<Table> {
        let mut tables = SchemaMap::new();
        tables.insert(
            "B".to_string(),
            table("B", &["Id", "A"], &[&["10", "#A(\"Alpha\")"], &["11", "#A(Beta)"]]),
        );
        tables.insert(
            "A".to_string(),
            table("A", &["Id", "Name"], &[&["1", "\"Alpha\""], &["2", "Beta"], &["3", "Beta"]]),
        );
        tables
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(
            SymbolicReference::parse(" #A( Alpha ) "),
            Some(SymbolicReference { schema: "A", name: "Alpha" })
        );
        assert!(SymbolicReference::parse("A(Alpha)").is_none());
        assert!(SymbolicReference::parse("#A").is_none());
        assert!(SymbolicReference::parse("\"#A(Alpha)\"").is_none());
    }

    #[test]
    fn test_name_with_comma_is_split_apart() {
        let fields = split_line("Values,B,#A(\"x, y\")");
        assert_eq!(fields, vec!["Values", "B", "#A(\"x", "y\")"]);
        assert!(SymbolicReference::parse(&fields[2]).is_none());
    }

    #[test]
    fn test_forward_reference_resolves_to_first_match() {
        let mut tables = tables();
        let resolved = resolve_references(&mut tables, &Conversions::default());
        assert_eq!(resolved, 2);
        let b = tables.get("B").unwrap();
        assert_eq!(b.rows[0][1], "1");
        assert_eq!(b.rows[1][1], "2");
    }

    #[test]
    fn test_unresolved_left_literal() {
        let mut tables = tables();
        tables.get_mut("B").unwrap().rows[0][1] = "#A(Gamma)".to_string();
        tables.get_mut("B").unwrap().rows[1][1] = "#Missing(Beta)".to_string();
        assert_eq!(resolve_references(&mut tables, &Conversions::default()), 0);
        assert_eq!(tables.get("B").unwrap().rows[0][1], "#A(Gamma)");
        assert_eq!(tables.get("B").unwrap().rows[1][1], "#Missing(Beta)");
    }

    #[test]
    fn test_missing_columns_leave_reference() {
        let mut tables = tables();
        tables.get_mut("A").unwrap().reference.name = "Label".to_string();
        assert_eq!(resolve_references(&mut tables, &Conversions::default()), 0);
    }

    #[test]
    fn test_name_matched_after_value_conversion() {
        let mut values = ConversionTable::new(true);
        values.push("Alpha", "Omega");
        let conversions = Conversions {
            types: ConversionTable::new(false),
            values,
        };
        let mut tables = tables();
        // Stored rows are already converted at this point.
        tables.get_mut("A").unwrap().rows[0][1] = "\"Omega\"".to_string();
        tables.get_mut("B").unwrap().rows[1][1] = "#A(Omega)".to_string();
        assert_eq!(resolve_references(&mut tables, &conversions), 2);
        assert_eq!(tables.get("B").unwrap().rows[0][1], "1");
        assert_eq!(tables.get("B").unwrap().rows[1][1], "1");
    }

    #[test]
    fn test_schema_found_by_source_name() {
        let mut types = ConversionTable::new(true);
        types.push("A", "Letters");
        let conversions = Conversions {
            types,
            values: ConversionTable::new(false),
        };
        let mut tables = tables();
        let mut letters = tables.get("A").unwrap().clone();
        letters.name = "Letters".to_string();
        let mut renamed = SchemaMap::new();
        renamed.insert("B".to_string(), tables.get("B").unwrap().clone());
        renamed.insert("Letters".to_string(), letters);
        tables = renamed;
        tables.get_mut("B").unwrap().rows[1][1] = "#Letters(Beta)".to_string();
        assert_eq!(resolve_references(&mut tables, &conversions), 2);
        assert_eq!(tables.get("B").unwrap().rows[0][1], "1");
        assert_eq!(tables.get("B").unwrap().rows[1][1], "2");
    }
}
