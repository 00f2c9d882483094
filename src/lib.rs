//! # serde_mtcsv
//!
//! A Serde-compatible reader and writer for multi-type CSV documents: plain
//! text files that hold rows of several record types at once, with
//! in-document configuration, auto-numbered ids, cross-type references and
//! metadata rows.
//!
//! ## Key Features
//!
//! - **Many schemas per file**: each schema declares its property names once
//!   and then lists value rows, in any order and interleaved with others
//! - **Typeless first**: parsing produces raw tables; binding to Rust types
//!   goes through `#[derive(Deserialize)]` afterwards
//! - **Self-configuring**: documents may rename their own prefixes and
//!   reference columns, globally or per schema
//! - **References and sequences**: `#` placeholders are numbered per schema,
//!   and `#Schema(Name)` fields resolve to the referenced row's id
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_mtcsv::parse;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Color { #[serde(rename = "Id")] id: u32, #[serde(rename = "Name")] name: String }
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Fruit { #[serde(rename = "Name")] name: String, #[serde(rename = "Color")] color: u32 }
//!
//! let input = "\
//! ! colors first
//! Properties,Color,Id,Name
//! Values,Color,#,\"Red\"
//! Values,Color,#,\"Yellow\"
//!
//! Properties,Fruit,Name,Color
//! Values,Fruit,\"Banana\",#Color(Yellow)
//! ";
//!
//! let document = parse(input).unwrap();
//! let fruit: Vec<Fruit> = document.bind("Fruit").unwrap();
//! assert_eq!(fruit, vec![Fruit { name: "Banana".into(), color: 2 }]);
//!
//! let colors: Vec<Color> = document.bind("Color").unwrap();
//! assert_eq!(colors[0], Color { id: 1, name: "Red".into() });
//! ```
//!
//! ## Writing
//!
//! ```rust
//! use serde::Serialize;
//! use serde_mtcsv::to_string;
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, y: i32 }
//!
//! let text = to_string("Point", &[Point { x: 1, y: 2 }]).unwrap();
//! assert_eq!(text, "Properties,Point,x,y\r\nValues,Point,1,2\r\n\r\n");
//! ```
//!
//! ## Logging
//!
//! The engine reports its progress through [`tracing`]: one `parse` span per
//! call, `debug` events at each pipeline state and `trace` events for
//! recoverable oddities such as padded rows or unresolved references.
//!
//! ## Format Reference
//!
//! See the [`format`] module for the complete line and field grammar.

pub mod classify;
pub mod config;
pub mod convert;
pub mod de;
pub mod engine;
pub mod error;
pub mod format;
pub mod map;
pub mod metadata;
pub mod options;
pub mod reference;
pub mod scalar;
pub mod sequence;
pub mod ser;
pub mod token;

pub use config::{ConfigKey, ReferenceColumns};
pub use de::{from_row, from_row_with_codec, RowDeserializer};
pub use engine::{Document, Engine, ParseState, Table};
pub use error::{Error, Result};
pub use map::SchemaMap;
pub use metadata::{MetadataDeclaration, MetadataKind, MetadataRecord, MetadataScope};
pub use options::{ParseOptions, ReferenceDefaults};
pub use scalar::{DefaultCodec, Number, Scalar, ScalarCodec};
pub use ser::Writer;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Parses a document with the default options.
///
/// # Examples
///
/// ```rust
/// use serde_mtcsv::parse;
///
/// let document = parse("Properties,Foo,A,B\nValues,Foo,1,\"x\"").unwrap();
/// assert_eq!(document.table("Foo").unwrap().get(0, "B"), Some("\"x\""));
/// ```
///
/// # Errors
///
/// Returns an error for prefix conflicts and missing or duplicate property blocks.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse(input: &str) -> Result<Document> {
    parse_with_options(input, ParseOptions::default())
}

/// Parses a document with custom options.
///
/// # Examples
///
/// ```rust
/// use serde_mtcsv::{parse_with_options, ParseOptions};
///
/// let options = ParseOptions::new().with_value_conversion(true);
/// let document = parse_with_options(
///     "ConversionValue,Bread,Loaf\nProperties,Food,Name\nValues,Food,\"Bread\"",
///     options,
/// )
/// .unwrap();
/// assert_eq!(document.table("Food").unwrap().get(0, "Name"), Some("\"Loaf\""));
/// ```
///
/// # Errors
///
/// Returns an error if the options are inconsistent or the document cannot be parsed.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_with_options(input: &str, options: ParseOptions) -> Result<Document> {
    Engine::new(options)?.parse(input)
}

/// Parses a document and binds every row of `schema` to `T`.
///
/// # Examples
///
/// ```rust
/// use serde_mtcsv::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let points: Vec<Point> = from_str("Properties,Point,x,y\nValues,Point,1,2", "Point").unwrap();
/// assert_eq!(points, vec![Point { x: 1, y: 2 }]);
/// ```
///
/// # Errors
///
/// Returns an error if the document cannot be parsed, has no such schema, or a
/// row cannot be bound to `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(input: &str, schema: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    parse(input)?.bind(schema)
}

/// Reads a whole document from an I/O stream and binds `schema` to `T`.
///
/// # Errors
///
/// Returns an error if reading fails or [`from_str`] would fail.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R, schema: &str) -> Result<Vec<T>>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::custom(e.to_string()))?;
    from_str(&string, schema)
}

/// Writes `items` as one schema block with the default prefixes.
///
/// # Errors
///
/// Returns an error if an item is not a struct or map or a field cannot be represented.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(schema: &str, items: &[T]) -> Result<String>
where
    T: Serialize,
{
    let mut writer = Writer::new(&ParseOptions::default());
    writer.write_schema(schema, items)?;
    Ok(writer.into_inner())
}

/// Writes `items` as one schema block to an I/O stream.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(mut writer: W, schema: &str, items: &[T]) -> Result<()>
where
    W: io::Write,
    T: Serialize,
{
    let text = to_string(schema, items)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::custom(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct User {
        id: u32,
        name: String,
        active: bool,
        score: Option<f64>,
    }

    #[test]
    fn test_write_then_read_points() {
        let points = vec![Point { x: 1, y: 2 }, Point { x: -3, y: 4 }];
        let text = to_string("Point", &points).unwrap();
        let back: Vec<Point> = from_str(&text, "Point").unwrap();
        assert_eq!(points, back);
    }

    #[test]
    fn test_write_then_read_users() {
        let users = vec![
            User {
                id: 1,
                name: "Ada, Countess".to_string(),
                active: true,
                score: Some(2.5),
            },
            User {
                id: 2,
                name: String::new(),
                active: false,
                score: None,
            },
        ];
        let text = to_string("User", &users).unwrap();
        let back: Vec<User> = from_str(&text, "User").unwrap();
        assert_eq!(users, back);
    }

    #[test]
    fn test_unknown_schema() {
        let err = from_str::<Point>("Properties,Point,x,y", "Line").unwrap_err();
        assert_eq!(err, Error::unknown_schema("Line"));
    }

    #[test]
    fn test_binding_error_names_row() {
        let err = from_str::<Point>("Properties,Point,x,y\nValues,Point,1,2\nValues,Point,a,2", "Point")
            .unwrap_err();
        assert!(matches!(err, Error::Binding { row: 1, .. }));
    }

    #[test]
    fn test_reader_and_writer() {
        let mut buffer = Vec::new();
        to_writer(&mut buffer, "Point", &[Point { x: 5, y: 6 }]).unwrap();
        let back: Vec<Point> = from_reader(buffer.as_slice(), "Point").unwrap();
        assert_eq!(back, vec![Point { x: 5, y: 6 }]);
    }
}
