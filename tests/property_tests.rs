//! Property-based tests for the tokenizer, the sequence counters and the
//! write/read cycle of typed rows.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_mtcsv::token::{split_line, unquote};
use serde_mtcsv::{from_str, parse, to_string};

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
struct Record {
    id: i64,
    name: String,
    flag: bool,
    amount: Option<u32>,
}

fn roundtrip(records: &[Record]) -> bool {
    match to_string("Record", records) {
        Ok(text) => match from_str::<Record>(&text, "Record") {
            Ok(back) => back == records,
            Err(e) => {
                eprintln!("Read failed: {}", e);
                eprintln!("Written was: {}", text);
                false
            }
        },
        Err(e) => {
            eprintln!("Write failed: {}", e);
            false
        }
    }
}

// Text the format can carry inside quotes: no quotes, no line breaks, no
// surrounding whitespace.
fn field_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,.;:#()-]{0,16}".prop_map(|s| s.trim().to_string())
}

fn record() -> impl Strategy<Value = Record> {
    (
        any::<i64>(),
        field_text(),
        any::<bool>(),
        proptest::option::of(any::<u32>()),
    )
        .prop_map(|(id, name, flag, amount)| Record {
            id,
            name,
            flag,
            amount,
        })
}

proptest! {
    #[test]
    fn prop_records_roundtrip(records in prop::collection::vec(record(), 1..10)) {
        prop_assert!(roundtrip(&records));
    }

    #[test]
    fn prop_quoted_fields_survive_split(parts in prop::collection::vec(field_text(), 1..6)) {
        let line = parts
            .iter()
            .map(|p| format!("\"{}\"", p))
            .collect::<Vec<_>>()
            .join(",");
        let fields = split_line(&line);
        let unquoted: Vec<&str> = fields.iter().map(|f| unquote(f)).collect();
        prop_assert_eq!(unquoted, parts.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn prop_placeholders_count_up(literals in prop::collection::vec(proptest::option::of(1000u32..2000), 1..20)) {
        let mut input = String::from("Properties,Foo,Id\n");
        for literal in &literals {
            match literal {
                Some(n) => input.push_str(&format!("Values,Foo,{}\n", n)),
                None => input.push_str("Values,Foo,#\n"),
            }
        }
        let document = parse(&input).unwrap();
        let ids = document.table("Foo").unwrap().column("Id").unwrap();

        let mut next = 1;
        for (id, literal) in ids.iter().zip(&literals) {
            match literal {
                Some(n) => prop_assert_eq!(id.to_string(), n.to_string()),
                None => {
                    prop_assert_eq!(id.to_string(), next.to_string());
                    next += 1;
                }
            }
        }
    }

    #[test]
    fn prop_parse_is_deterministic(names in prop::collection::vec("[A-Z][a-z]{0,6}", 1..5)) {
        let mut input = String::new();
        for name in &names {
            input.push_str(&format!("Properties,{0},Id\nValues,{0},#\nValues,{0},#\n", name));
        }
        // Repeated schema names are duplicate property blocks.
        let first = parse(&input);
        let second = parse(&input);
        prop_assert_eq!(first, second);
    }
}
