//! Writing multi-type CSV documents.
//!
//! This module provides the [`Writer`] that turns typed collections,
//! typeless tables and metadata records back into document text.
//!
//! ## Overview
//!
//! - **Schemas** are written as one property line followed by one value line
//!   per item, then a blank line.
//! - **Fields** go through a [`ScalarCodec`]: strings are double-quoted,
//!   numbers and booleans are bare, unit enum variants become `Type.Member`
//!   and `None` is an empty field.
//! - **Lines** end with CRLF.
//!
//! Comments are never written, and reading a written document back yields
//! the same tables.
//!
//! ## Usage
//!
//! ```rust
//! use serde::Serialize;
//! use serde_mtcsv::{ParseOptions, Writer};
//!
//! #[derive(Serialize)]
//! struct Fruit { id: u32, name: String }
//!
//! let mut writer = Writer::new(&ParseOptions::default());
//! writer
//!     .write_schema("Fruit", &[Fruit { id: 1, name: "Apple".into() }])
//!     .unwrap();
//!
//! assert_eq!(
//!     writer.into_inner(),
//!     "Properties,Fruit,id,name\r\nValues,Fruit,1,\"Apple\"\r\n\r\n"
//! );
//! ```

use crate::config::ConfigKey;
use crate::engine::{Document, Table};
use crate::metadata::MetadataRecord;
use crate::scalar::{DefaultCodec, Number, Scalar, ScalarCodec};
use crate::token::{join_fields, unquote};
use crate::{Error, ParseOptions, Result};
use serde::ser::{self, Impossible, Serialize};

const LINE_END: &str = "\r\n";

/// Accumulates document text.
///
/// Created via [`Writer::new`]; the prefixes come from the given options.
pub struct Writer<C = DefaultCodec> {
    output: String,
    property_prefix: String,
    value_prefix: String,
    global_config_prefix: String,
    typed_config_prefix: String,
    codec: C,
}

impl Writer {
    pub fn new(options: &ParseOptions) -> Self {
        Writer {
            output: String::with_capacity(256),
            property_prefix: options.property_prefix.clone(),
            value_prefix: options.value_prefix.clone(),
            global_config_prefix: options.global_config_prefix.clone(),
            typed_config_prefix: options.typed_config_prefix.clone(),
            codec: DefaultCodec,
        }
    }
}

impl<C: ScalarCodec> Writer<C> {
    /// Replaces the codec used to encode typed fields.
    pub fn with_codec<D: ScalarCodec>(self, codec: D) -> Writer<D> {
        Writer {
            output: self.output,
            property_prefix: self.property_prefix,
            value_prefix: self.value_prefix,
            global_config_prefix: self.global_config_prefix,
            typed_config_prefix: self.typed_config_prefix,
            codec,
        }
    }

    pub fn into_inner(self) -> String {
        self.output
    }

    fn write_line<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.output.push_str(&join_fields(fields));
        self.output.push_str(LINE_END);
    }

    fn end_block(&mut self) {
        self.output.push_str(LINE_END);
    }

    /// Writes `GlobalConfig,<key>,<value>`.
    pub fn write_global_config(&mut self, key: ConfigKey, value: &str) {
        let prefix = self.global_config_prefix.clone();
        self.write_line([prefix.as_str(), key.as_str(), value]);
    }

    /// Writes `TypedConfig,<schema>,<key>,<value>`.
    pub fn write_typed_config(&mut self, schema: &str, key: ConfigKey, value: &str) {
        let prefix = self.typed_config_prefix.clone();
        self.write_line([prefix.as_str(), schema, key.as_str(), value]);
    }

    /// Writes `items` as a schema block.
    ///
    /// Property names come from the first item, so an empty slice writes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if an item is not a struct or map, or if a field
    /// holds a nested collection or text the format cannot represent.
    pub fn write_schema<T>(&mut self, schema: &str, items: &[T]) -> Result<()>
    where
        T: Serialize,
    {
        check_name("schema", schema)?;
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let mut row = RowSerializer::new(&self.codec);
            item.serialize(&mut row)?;
            rows.push(row.fields);
        }
        let Some(first) = rows.first() else {
            return Ok(());
        };

        let names: Vec<String> = first.iter().map(|(name, _)| name.clone()).collect();
        for name in &names {
            check_name("property", name)?;
        }
        self.write_block(schema, &names, rows.into_iter().map(|row| {
            row.into_iter().map(|(_, field)| field).collect::<Vec<_>>()
        }));
        Ok(())
    }

    /// Writes a typeless table with its stored name, keeping raw fields as they are.
    pub fn write_table(&mut self, table: &Table) {
        self.write_block(&table.name, &table.properties, table.rows.iter());
    }

    fn write_block<I, R, S>(&mut self, schema: &str, properties: &[String], rows: I)
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let property_prefix = self.property_prefix.clone();
        let value_prefix = self.value_prefix.clone();

        let header = [property_prefix.as_str(), schema]
            .into_iter()
            .map(str::to_string)
            .chain(properties.iter().cloned());
        self.write_line(header);
        for row in rows {
            let line = [value_prefix.as_str(), schema]
                .into_iter()
                .map(str::to_string)
                .chain(row.into_iter().map(|field| field.as_ref().to_string()));
            self.write_line(line);
        }
        self.end_block();
    }

    /// Writes one metadata record as a `<prefix>,<schema>,...` line.
    pub fn write_metadata(&mut self, schema: &str, record: &MetadataRecord) {
        let fields: Vec<String> = match record {
            MetadataRecord::Mapping { entries, .. } => entries
                .values()
                .map(|value| match value {
                    Some(text) => self.codec.encode(&Scalar::String(text.clone())),
                    None => String::new(),
                })
                .collect(),
            MetadataRecord::Structured { fields, .. } => fields.values().cloned().collect(),
        };
        let line = [record.prefix(), schema]
            .into_iter()
            .map(str::to_string)
            .chain(fields);
        self.write_line(line);
    }

    /// Writes a mapping line from plain values; `None` leaves the field empty.
    pub fn write_mapping(&mut self, prefix: &str, schema: &str, values: &[Option<&str>]) {
        let fields: Vec<String> = values
            .iter()
            .map(|value| {
                value
                    .map(|text| self.codec.encode(&Scalar::from(text)))
                    .unwrap_or_default()
            })
            .collect();
        let line = [prefix, schema].into_iter().map(str::to_string).chain(fields);
        self.write_line(line);
    }

    /// Writes every table, then every schema's metadata as one block.
    pub fn write_document(&mut self, document: &Document) {
        for table in document.tables.values() {
            self.write_table(table);
        }
        for (schema, records) in &document.metadata {
            for record in records {
                self.write_metadata(schema, record);
            }
            self.end_block();
        }
    }
}

/// Schema and property names are written bare, so they must survive splitting and trimming.
fn check_name(kind: &str, name: &str) -> Result<()> {
    let unsafe_char = name
        .chars()
        .any(|c| matches!(c, ',' | '"' | '\r' | '\n'));
    if name.is_empty() || unsafe_char || name.trim() != name {
        return Err(Error::custom(format!(
            "{} name cannot be written: {:?}",
            kind, name
        )));
    }
    Ok(())
}

/// Collects the named fields of one struct or map.
struct RowSerializer<'a, C> {
    codec: &'a C,
    fields: Vec<(String, String)>,
    key: Option<String>,
}

impl<'a, C: ScalarCodec> RowSerializer<'a, C> {
    fn new(codec: &'a C) -> Self {
        RowSerializer {
            codec,
            fields: Vec::new(),
            key: None,
        }
    }

    fn field<T>(&self, value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(FieldSerializer { codec: self.codec })
    }
}

fn not_a_row<T>() -> Result<T> {
    Err(Error::custom("rows must be structs or maps"))
}

impl<'a, 'b, C: ScalarCodec> ser::Serializer for &'b mut RowSerializer<'a, C> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Impossible<(), Error>;
    type SerializeTuple = Impossible<(), Error>;
    type SerializeTupleStruct = Impossible<(), Error>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Impossible<(), Error>;

    fn serialize_bool(self, _v: bool) -> Result<()> {
        not_a_row()
    }

    fn serialize_i8(self, _v: i8) -> Result<()> {
        not_a_row()
    }

    fn serialize_i16(self, _v: i16) -> Result<()> {
        not_a_row()
    }

    fn serialize_i32(self, _v: i32) -> Result<()> {
        not_a_row()
    }

    fn serialize_i64(self, _v: i64) -> Result<()> {
        not_a_row()
    }

    fn serialize_u8(self, _v: u8) -> Result<()> {
        not_a_row()
    }

    fn serialize_u16(self, _v: u16) -> Result<()> {
        not_a_row()
    }

    fn serialize_u32(self, _v: u32) -> Result<()> {
        not_a_row()
    }

    fn serialize_u64(self, _v: u64) -> Result<()> {
        not_a_row()
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        not_a_row()
    }

    fn serialize_f64(self, _v: f64) -> Result<()> {
        not_a_row()
    }

    fn serialize_char(self, _v: char) -> Result<()> {
        not_a_row()
    }

    fn serialize_str(self, _v: &str) -> Result<()> {
        not_a_row()
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        not_a_row()
    }

    fn serialize_none(self) -> Result<()> {
        not_a_row()
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        not_a_row()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        not_a_row()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        not_a_row()
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        not_a_row()
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        not_a_row()
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        not_a_row()
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        not_a_row()
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        not_a_row()
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        not_a_row()
    }
}

impl<'a, 'b, C: ScalarCodec> ser::SerializeStruct for &'b mut RowSerializer<'a, C> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let field = self.field(value)?;
        self.fields.push((key.to_string(), field));
        Ok(())
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b, C: ScalarCodec> ser::SerializeMap for &'b mut RowSerializer<'a, C> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = key.serialize(FieldSerializer {
            codec: &DefaultCodec,
        })?;
        self.key = Some(unquote(&key).to_string());
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called before serialize_key"))?;
        let field = self.field(value)?;
        self.fields.push((key, field));
        Ok(())
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Encodes one scalar field.
struct FieldSerializer<'a, C> {
    codec: &'a C,
}

impl<'a, C: ScalarCodec> FieldSerializer<'a, C> {
    fn encode(&self, scalar: Scalar) -> Result<String> {
        if let Scalar::String(text) = &scalar {
            if text.contains('"') || text.contains('\n') || text.contains('\r') {
                return Err(Error::custom(format!(
                    "field text cannot contain quotes or line breaks: {:?}",
                    text
                )));
            }
        }
        Ok(self.codec.encode(&scalar))
    }
}

fn nested<T>() -> Result<T> {
    Err(Error::custom("fields cannot hold nested collections"))
}

impl<'a, C: ScalarCodec> ser::Serializer for FieldSerializer<'a, C> {
    type Ok = String;
    type Error = Error;

    type SerializeSeq = Impossible<String, Error>;
    type SerializeTuple = Impossible<String, Error>;
    type SerializeTupleStruct = Impossible<String, Error>;
    type SerializeTupleVariant = Impossible<String, Error>;
    type SerializeMap = Impossible<String, Error>;
    type SerializeStruct = Impossible<String, Error>;
    type SerializeStructVariant = Impossible<String, Error>;

    fn serialize_bool(self, v: bool) -> Result<String> {
        self.encode(Scalar::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<String> {
        self.encode(Scalar::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<String> {
        self.encode(Scalar::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<String> {
        self.encode(Scalar::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<String> {
        self.encode(Scalar::from(v))
    }

    fn serialize_u8(self, v: u8) -> Result<String> {
        self.encode(Scalar::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<String> {
        self.encode(Scalar::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<String> {
        self.encode(Scalar::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<String> {
        match i64::try_from(v) {
            Ok(i) => self.encode(Scalar::Number(Number::Integer(i))),
            // Too large for the scalar model; still a valid bare number.
            Err(_) => Ok(v.to_string()),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<String> {
        self.encode(Scalar::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<String> {
        self.encode(Scalar::from(v))
    }

    fn serialize_char(self, v: char) -> Result<String> {
        self.encode(Scalar::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<String> {
        self.encode(Scalar::from(v))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        nested()
    }

    fn serialize_none(self) -> Result<String> {
        self.encode(Scalar::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<String> {
        self.encode(Scalar::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String> {
        self.encode(Scalar::Null)
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        self.encode(Scalar::Enum {
            type_name: Some(name.to_string()),
            member: variant.to_string(),
        })
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String>
    where
        T: ?Sized + Serialize,
    {
        nested()
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        nested()
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        nested()
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        nested()
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        nested()
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        nested()
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        nested()
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        nested()
    }
}
