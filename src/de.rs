//! Row binding.
//!
//! This module provides the [`RowDeserializer`] that turns one typeless row
//! (property names plus raw fields) into any type implementing `Deserialize`.
//!
//! ## Overview
//!
//! - **Structs** are filled field by field; each field is looked up by name
//!   among the row's properties, and properties the struct does not know are
//!   ignored.
//! - **Maps** receive every property in column order.
//! - **Tuples and sequences** receive the fields in column order.
//! - **Scalars** are decoded by a [`ScalarCodec`] and coerced leniently: an
//!   empty field binds as `None`, `0`, `false` or `""` depending on the target.
//!
//! ## Usage
//!
//! Most users bind whole schemas through [`Document::bind`](crate::Document::bind)
//! or [`from_str`](crate::from_str); [`from_row`] binds a single row:
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_mtcsv::from_row;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Fruit { id: u32, name: String, ripe: bool }
//!
//! let properties = vec!["id".to_string(), "name".to_string(), "ripe".to_string()];
//! let row = vec!["3".to_string(), "\"Pear\"".to_string(), "true".to_string()];
//! let fruit: Fruit = from_row(&properties, &row).unwrap();
//! assert_eq!(fruit, Fruit { id: 3, name: "Pear".into(), ripe: true });
//! ```
//!
//! ## Enumerations
//!
//! Unit variants bind from either `Member` or `Type.Member`:
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_mtcsv::from_row;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! enum Color { Red, Green }
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Paint { color: Color }
//!
//! let properties = vec!["color".to_string()];
//! let paint: Paint = from_row(&properties, &["Color.Green".to_string()]).unwrap();
//! assert_eq!(paint.color, Color::Green);
//! ```

use crate::scalar::{DefaultCodec, Number, Scalar, ScalarCodec};
use crate::token::unquote;
use crate::{Error, Result};
use serde::de::{self, DeserializeOwned, IntoDeserializer};
use serde::{forward_to_deserialize_any, Deserialize};

/// Binds one row with the [`DefaultCodec`].
///
/// # Errors
///
/// Returns an error if a field cannot be coerced into its target type.
pub fn from_row<T>(properties: &[String], row: &[String]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_row_with_codec(properties, row, &DefaultCodec)
}

/// Binds one row, decoding fields with `codec`.
pub fn from_row_with_codec<T, C>(properties: &[String], row: &[String], codec: &C) -> Result<T>
where
    T: DeserializeOwned,
    C: ScalarCodec,
{
    T::deserialize(RowDeserializer::new(properties, row, codec))
}

/// The field names a derived struct declares, or `None` for anything else.
///
/// ```rust
/// use serde::Deserialize;
/// use serde_mtcsv::de::struct_fields;
///
/// #[derive(Deserialize)]
/// struct Note { author: String, text: String }
///
/// assert_eq!(struct_fields::<Note>(), Some(&["author", "text"][..]));
/// assert_eq!(struct_fields::<u32>(), None);
/// ```
#[must_use]
pub fn struct_fields<T>() -> Option<&'static [&'static str]>
where
    T: for<'de> Deserialize<'de>,
{
    let mut fields = None;
    // The probe always errors; only the captured field list matters.
    let _ = T::deserialize(FieldProbe(&mut fields));
    fields
}

struct FieldProbe<'a>(&'a mut Option<&'static [&'static str]>);

impl<'de> de::Deserializer<'de> for FieldProbe<'_> {
    type Error = Error;

    fn deserialize_any<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::custom("not a struct"))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        *self.0 = Some(fields);
        Err(Error::custom("fields captured"))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

/// Deserializes a single row.
///
/// Created via [`RowDeserializer::new`].
pub struct RowDeserializer<'a, C> {
    properties: &'a [String],
    row: &'a [String],
    codec: &'a C,
}

impl<'a, C: ScalarCodec> RowDeserializer<'a, C> {
    pub fn new(properties: &'a [String], row: &'a [String], codec: &'a C) -> Self {
        RowDeserializer {
            properties,
            row,
            codec,
        }
    }

    fn field(&self, property: &str) -> &'a str {
        self.properties
            .iter()
            .position(|name| name == property)
            .and_then(|i| self.row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

impl<'de, 'a, C: ScalarCodec> de::Deserializer<'de> for RowDeserializer<'a, C> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let entries = self
            .properties
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), self.row.get(i).map(String::as_str).unwrap_or("")))
            .collect();
        visitor.visit_map(RowAccess::new(entries, self.codec))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let entries = fields
            .iter()
            .map(|field| (*field, self.field(field)))
            .collect();
        visitor.visit_map(RowAccess::new(entries, self.codec))
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_seq(FieldsAccess {
            fields: self.row.iter(),
            codec: self.codec,
        })
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct enum identifier ignored_any
    }
}

struct RowAccess<'a, C> {
    iter: std::vec::IntoIter<(&'a str, &'a str)>,
    field: Option<&'a str>,
    codec: &'a C,
}

impl<'a, C> RowAccess<'a, C> {
    fn new(entries: Vec<(&'a str, &'a str)>, codec: &'a C) -> Self {
        RowAccess {
            iter: entries.into_iter(),
            field: None,
            codec,
        }
    }
}

impl<'de, 'a, C: ScalarCodec> de::MapAccess<'de> for RowAccess<'a, C> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((name, field)) => {
                self.field = Some(field);
                seed.deserialize(name.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.field.take() {
            Some(raw) => seed.deserialize(FieldDeserializer::new(raw, self.codec)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct FieldsAccess<'a, C> {
    fields: std::slice::Iter<'a, String>,
    codec: &'a C,
}

impl<'de, 'a, C: ScalarCodec> de::SeqAccess<'de> for FieldsAccess<'a, C> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.fields.next() {
            Some(raw) => seed.deserialize(FieldDeserializer::new(raw, self.codec)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

/// Deserializes one raw field.
struct FieldDeserializer<'a> {
    raw: &'a str,
    scalar: Scalar,
}

impl<'a> FieldDeserializer<'a> {
    fn new<C: ScalarCodec>(raw: &'a str, codec: &C) -> Self {
        FieldDeserializer {
            raw,
            scalar: codec.decode(raw),
        }
    }

    /// Text for string targets: quoted content, or the raw field as written.
    fn text(&self) -> String {
        match &self.scalar {
            Scalar::String(s) => s.clone(),
            _ => unquote(self.raw.trim()).to_string(),
        }
    }

    fn invalid(&self, expected: &str) -> Error {
        Error::custom(format!("invalid {} '{}'", expected, self.raw.trim()))
    }
}

macro_rules! deserialize_integer {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                // Bare integers outside the i64 range never reach the scalar model intact.
                if let Ok(value) = self.raw.trim().parse::<$ty>() {
                    return visitor.$visit(value);
                }
                let value: $ty = match &self.scalar {
                    Scalar::Null => 0,
                    Scalar::Bool(true) => 1,
                    Scalar::Bool(false) => 0,
                    Scalar::Number(Number::Integer(i)) => {
                        <$ty>::try_from(*i).map_err(|_| self.invalid(stringify!($ty)))?
                    }
                    Scalar::Number(Number::Float(f)) if f.fract() == 0.0 => {
                        <$ty>::try_from(*f as i64).map_err(|_| self.invalid(stringify!($ty)))?
                    }
                    Scalar::String(s) => s
                        .trim()
                        .parse::<$ty>()
                        .map_err(|_| self.invalid(stringify!($ty)))?,
                    _ => return Err(self.invalid(stringify!($ty))),
                };
                visitor.$visit(value)
            }
        )*
    };
}

impl<'de, 'a> de::Deserializer<'de> for FieldDeserializer<'a> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.scalar {
            Scalar::Null => visitor.visit_unit(),
            Scalar::Bool(b) => visitor.visit_bool(b),
            Scalar::Number(Number::Integer(i)) => visitor.visit_i64(i),
            Scalar::Number(Number::Float(f)) => visitor.visit_f64(f),
            Scalar::String(s) => visitor.visit_string(s),
            enumeration @ Scalar::Enum { .. } => visitor.visit_string(enumeration.text()),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let value = match &self.scalar {
            Scalar::Null => false,
            Scalar::Bool(b) => *b,
            Scalar::Number(Number::Integer(0)) => false,
            Scalar::Number(Number::Integer(1)) => true,
            Scalar::String(s) if s.eq_ignore_ascii_case("true") => true,
            Scalar::String(s) if s.eq_ignore_ascii_case("false") => false,
            _ => return Err(self.invalid("bool")),
        };
        visitor.visit_bool(value)
    }

    deserialize_integer! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let value = match &self.scalar {
            Scalar::Null => 0.0,
            Scalar::Number(n) => n.as_f64(),
            Scalar::String(s) => s.trim().parse().map_err(|_| self.invalid("float"))?,
            _ => return Err(self.invalid("float")),
        };
        visitor.visit_f64(value)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let text = self.text();
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(self.invalid("char")),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(self.text())
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(self.text())
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.scalar.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let member = match &self.scalar {
            Scalar::Enum { member, .. } => member.clone(),
            Scalar::String(s) => s.clone(),
            _ => return Err(self.invalid("enum member")),
        };
        visitor.visit_enum(member.into_deserializer())
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bytes byte_buf seq tuple tuple_struct map struct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Item {
        id: u32,
        name: String,
        price: f64,
        note: Option<String>,
    }

    #[test]
    fn test_struct_by_name_ignores_extra_columns() {
        let properties = strings(&["name", "extra", "id", "price", "note"]);
        let row = strings(&["\"Loaf\"", "x", "4", "2.5", ""]);
        let item: Item = from_row(&properties, &row).unwrap();
        assert_eq!(
            item,
            Item {
                id: 4,
                name: "Loaf".to_string(),
                price: 2.5,
                note: None,
            }
        );
    }

    #[test]
    fn test_missing_and_empty_fields_are_lenient() {
        let properties = strings(&["name"]);
        let item: Item = from_row(&properties, &strings(&[""])).unwrap();
        assert_eq!(item.id, 0);
        assert_eq!(item.name, "");
        assert_eq!(item.price, 0.0);
        assert_eq!(item.note, None);
    }

    #[test]
    fn test_string_targets_keep_digits() {
        #[derive(Deserialize)]
        struct Code {
            code: String,
        }
        let code: Code = from_row(&strings(&["code"]), &strings(&["007"])).unwrap();
        assert_eq!(code.code, "007");
    }

    #[test]
    fn test_out_of_range_integer() {
        #[derive(Deserialize, Debug)]
        struct Small {
            #[allow(dead_code)]
            n: u8,
        }
        let err = from_row::<Small>(&strings(&["n"]), &strings(&["300"])).unwrap_err();
        assert_eq!(err, Error::custom("invalid u8 '300'"));
    }

    #[test]
    fn test_u64_above_i64_range() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Big {
            n: u64,
        }
        let big: Big = from_row(&strings(&["n"]), &strings(&["18446744073709551615"])).unwrap();
        assert_eq!(big, Big { n: u64::MAX });
    }

    #[test]
    fn test_bad_bool() {
        #[derive(Deserialize, Debug)]
        struct Flag {
            #[allow(dead_code)]
            on: bool,
        }
        assert!(from_row::<Flag>(&strings(&["on"]), &strings(&["maybe"])).is_err());
        assert!(from_row::<Flag>(&strings(&["on"]), &strings(&["1"])).unwrap().on);
    }

    #[test]
    fn test_map_and_tuple_targets() {
        let properties = strings(&["a", "b"]);
        let row = strings(&["1", "\"two\""]);
        let map: BTreeMap<String, String> = from_row(&properties, &row).unwrap();
        assert_eq!(map.get("b").map(String::as_str), Some("two"));

        let tuple: (i32, String) = from_row(&properties, &row).unwrap();
        assert_eq!(tuple, (1, "two".to_string()));
    }

    #[test]
    fn test_enum_with_and_without_type() {
        #[derive(Deserialize, Debug, PartialEq)]
        enum Size {
            Small,
            Large,
        }
        #[derive(Deserialize, Debug, PartialEq)]
        struct Parcel {
            a: Size,
            b: Size,
        }
        let parcel: Parcel =
            from_row(&strings(&["a", "b"]), &strings(&["Size.Large", "Small"])).unwrap();
        assert_eq!(parcel, Parcel { a: Size::Large, b: Size::Small });
    }

    #[test]
    fn test_struct_fields_of_non_struct() {
        assert_eq!(struct_fields::<String>(), None);
        assert_eq!(struct_fields::<Item>(), Some(&["id", "name", "price", "note"][..]));
    }
}
