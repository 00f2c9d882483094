//! Scalar field coercion.
//!
//! Rows are kept as raw text until they are bound to a Rust type. The
//! [`ScalarCodec`] decides how that text maps to a typed [`Scalar`] and back:
//!
//! | Text                | Scalar                              |
//! |---------------------|-------------------------------------|
//! | *(empty)*           | `Null`                              |
//! | `"quoted text"`     | `String("quoted text")`             |
//! | `true` / `False`    | `Bool`                              |
//! | `42`, `-7`          | `Number(Integer)`                   |
//! | `3.5`, `1e3`        | `Number(Float)`                     |
//! | `Color.Red`         | `Enum { type_name: "Color", member: "Red" }` |
//! | anything else       | `String` (unquoted text is accepted leniently) |
//!
//! ```rust
//! use serde_mtcsv::{DefaultCodec, Number, Scalar, ScalarCodec};
//!
//! let codec = DefaultCodec;
//! assert_eq!(codec.decode("42"), Scalar::Number(Number::Integer(42)));
//! assert_eq!(codec.decode("\"42\""), Scalar::String("42".to_string()));
//! assert_eq!(codec.encode(&Scalar::Bool(true)), "true");
//! ```

use crate::token::{is_quoted, unquote};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed field value.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Enum {
        type_name: Option<String>,
        member: String,
    },
}

/// A numeric field value.
///
/// # Examples
///
/// ```rust
/// use serde_mtcsv::Number;
///
/// assert_eq!(Number::Integer(42).as_i64(), Some(42));
/// assert_eq!(Number::Float(42.0).as_i64(), Some(42));
/// assert_eq!(Number::Float(42.5).as_i64(), None);
/// assert_eq!(Number::Integer(3).as_f64(), 3.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    /// Converts this number to an `i64` when it has no fractional part and fits.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{}", fl),
        }
    }
}

macro_rules! number_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::Integer(value as i64)
                }
            }
        )*
    };
}

number_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::Float(value as f64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl Scalar {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// The textual content of this scalar, without quotes.
    ///
    /// ```rust
    /// use serde_mtcsv::{Number, Scalar};
    ///
    /// assert_eq!(Scalar::String("a b".into()).text(), "a b");
    /// assert_eq!(Scalar::Number(Number::Integer(7)).text(), "7");
    /// assert_eq!(
    ///     Scalar::Enum { type_name: Some("Color".into()), member: "Red".into() }.text(),
    ///     "Color.Red"
    /// );
    /// ```
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::String(s) => s.clone(),
            Scalar::Enum {
                type_name: Some(type_name),
                member,
            } => format!("{}.{}", type_name, member),
            Scalar::Enum {
                type_name: None,
                member,
            } => member.clone(),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

macro_rules! scalar_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::Number(Number::from(value))
                }
            }
        )*
    };
}

scalar_from_number!(i8, i16, i32, i64, u8, u16, u32, f32, f64);

/// Converts between raw field text and [`Scalar`]s.
///
/// Implement this to change how booleans, numbers or enumerations are
/// recognized; the engine itself never coerces fields, only the binder and
/// the writer do.
pub trait ScalarCodec {
    fn decode(&self, raw: &str) -> Scalar;

    fn encode(&self, scalar: &Scalar) -> String;
}

/// The built-in codec: strings are double-quoted, everything else is bare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultCodec;

impl ScalarCodec for DefaultCodec {
    fn decode(&self, raw: &str) -> Scalar {
        let raw = raw.trim();
        if raw.is_empty() {
            return Scalar::Null;
        }
        if is_quoted(raw) {
            return Scalar::String(unquote(raw).to_string());
        }
        if raw.eq_ignore_ascii_case("true") {
            return Scalar::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Scalar::Bool(false);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Scalar::Number(Number::Integer(i));
        }
        if looks_numeric(raw) {
            if let Ok(f) = raw.parse::<f64>() {
                return Scalar::Number(Number::Float(f));
            }
        }
        if let Some((type_name, member)) = split_enum(raw) {
            return Scalar::Enum {
                type_name: Some(type_name.to_string()),
                member: member.to_string(),
            };
        }
        Scalar::String(raw.to_string())
    }

    fn encode(&self, scalar: &Scalar) -> String {
        match scalar {
            Scalar::String(s) => format!("\"{}\"", s),
            other => other.text(),
        }
    }
}

// Keeps "inf"/"NaN" and friends from being read as floats.
fn looks_numeric(raw: &str) -> bool {
    raw.bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn split_enum(raw: &str) -> Option<(&str, &str)> {
    let (type_name, member) = raw.rsplit_once('.')?;
    let valid = !type_name.is_empty()
        && type_name.split('.').all(is_identifier)
        && is_identifier(member);
    valid.then_some((type_name, member))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_primitives() {
        let codec = DefaultCodec;
        assert_eq!(codec.decode(""), Scalar::Null);
        assert_eq!(codec.decode("  "), Scalar::Null);
        assert_eq!(codec.decode("\"\""), Scalar::String(String::new()));
        assert_eq!(codec.decode("TRUE"), Scalar::Bool(true));
        assert_eq!(codec.decode("false"), Scalar::Bool(false));
        assert_eq!(codec.decode("-12"), Scalar::Number(Number::Integer(-12)));
        assert_eq!(codec.decode("2.5"), Scalar::Number(Number::Float(2.5)));
    }

    #[test]
    fn test_decode_enum_member() {
        assert_eq!(
            DefaultCodec.decode("Shape.Circle"),
            Scalar::Enum {
                type_name: Some("Shape".to_string()),
                member: "Circle".to_string(),
            }
        );
        assert_eq!(
            DefaultCodec.decode("geo.Shape.Circle"),
            Scalar::Enum {
                type_name: Some("geo.Shape".to_string()),
                member: "Circle".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_lenient_text() {
        assert_eq!(DefaultCodec.decode("inf"), Scalar::String("inf".to_string()));
        assert_eq!(
            DefaultCodec.decode("plain words"),
            Scalar::String("plain words".to_string())
        );
        assert_eq!(DefaultCodec.decode("1.x"), Scalar::String("1.x".to_string()));
    }

    #[test]
    fn test_encode() {
        let codec = DefaultCodec;
        assert_eq!(codec.encode(&Scalar::Null), "");
        assert_eq!(codec.encode(&Scalar::from("Bread")), "\"Bread\"");
        assert_eq!(codec.encode(&Scalar::from(3u8)), "3");
        assert_eq!(codec.encode(&Scalar::from(0.5f64)), "0.5");
        assert_eq!(
            codec.encode(&Scalar::Enum {
                type_name: Some("Shape".into()),
                member: "Square".into()
            }),
            "Shape.Square"
        );
    }
}
