//! Format conformance tests
//!
//! Line and field grammar as documented in `serde_mtcsv::format`.

use serde::{Deserialize, Serialize};
use serde_mtcsv::{parse, parse_with_options, to_string, DefaultCodec, ParseOptions, Scalar, ScalarCodec};

#[test]
fn test_every_comment_prefix_is_skipped() {
    let input = "\
! bang
# hash
; semicolon
// slashes
-- dashes
Properties,Foo,A
   ! indented comment
Values,Foo,1
";
    let document = parse(input).unwrap();
    assert_eq!(document.tables.len(), 1);
    assert_eq!(document.table("Foo").unwrap().len(), 1);
}

#[test]
fn test_custom_comment_prefixes() {
    let options = ParseOptions::new().with_comment_prefixes(["REM"]);
    let document =
        parse_with_options("REM Properties,Bad,A\nProperties,Foo,A\nValues,Foo,1", options).unwrap();
    assert!(document.table("Bad").is_none());
    assert!(document.table("Foo").is_some());
}

#[test]
fn test_line_endings_and_blank_lines() {
    let document = parse("Properties,Foo,A\r\n\r\n   \r\nValues,Foo,1\r\nValues,Foo,2").unwrap();
    assert_eq!(
        document.table("Foo").unwrap().column("A"),
        Some(vec!["1", "2"])
    );
}

#[test]
fn test_fields_are_trimmed() {
    let document = parse("  Properties , Foo , A , B \nValues,Foo,  1 ,  \"x y\"  ").unwrap();
    let foo = document.table("Foo").unwrap();
    assert_eq!(foo.properties, vec!["A", "B"]);
    assert_eq!(foo.rows[0], vec!["1", "\"x y\""]);
}

#[test]
fn test_quoted_property_names_are_unquoted() {
    let document = parse("Properties,Foo,\"First Name\",Age\nValues,Foo,\"Ann\",3").unwrap();
    assert_eq!(document.table("Foo").unwrap().get(0, "First Name"), Some("\"Ann\""));
}

#[test]
fn test_unknown_prefixes_are_ignored() {
    let document = parse("Junk,Foo,1\nProperties,Foo,A\nValues,Foo,1\nMore,Junk").unwrap();
    assert_eq!(document.table("Foo").unwrap().len(), 1);
    assert!(document.table("Junk").is_none());
}

#[test]
fn test_scalar_decoding() {
    let codec = DefaultCodec;
    assert_eq!(codec.decode(""), Scalar::Null);
    assert_eq!(codec.decode("\"42\""), Scalar::String("42".to_string()));
    assert_eq!(codec.decode("True"), Scalar::Bool(true));
    assert_eq!(codec.decode("42"), Scalar::from(42i64));
    assert_eq!(codec.decode("-0.5"), Scalar::from(-0.5f64));
    assert_eq!(
        codec.decode("Weekday.Monday"),
        Scalar::Enum {
            type_name: Some("Weekday".to_string()),
            member: "Monday".to_string(),
        }
    );
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Weekday {
    Monday,
    Friday,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Shift {
    day: Weekday,
    person: String,
    hours: f32,
    paid: bool,
    note: Option<String>,
    label: char,
}

#[test]
fn test_field_encoding() {
    let shifts = vec![Shift {
        day: Weekday::Friday,
        person: "Kim".to_string(),
        hours: 7.5,
        paid: true,
        note: None,
        label: 'k',
    }];
    let text = to_string("Shift", &shifts).unwrap();
    assert_eq!(
        text,
        "Properties,Shift,day,person,hours,paid,note,label\r\n\
         Values,Shift,Weekday.Friday,\"Kim\",7.5,true,,\"k\"\r\n\r\n"
    );
    let back: Vec<Shift> = serde_mtcsv::from_str(&text, "Shift").unwrap();
    assert_eq!(back, shifts);
}

#[test]
fn test_placeholder_is_configurable() {
    let options = ParseOptions::new().with_placeholder("auto");
    let document =
        parse_with_options("Properties,Foo,Id\nValues,Foo,auto\nValues,Foo,#", options).unwrap();
    assert_eq!(
        document.table("Foo").unwrap().column("Id"),
        Some(vec!["1", "#"])
    );
}

#[test]
fn test_schema_order_follows_first_mention() {
    let document = parse("Values,B,1\nProperties,A,X\nProperties,B,Y").unwrap();
    let names: Vec<&String> = document.tables.keys().collect();
    assert_eq!(names, vec!["B", "A"]);
}
