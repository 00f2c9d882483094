//! Multi-type CSV format reference
//!
//! This module documents the document format as implemented by this library.
//! It contains no code.
//!
//! # Overview
//!
//! A document is plain text holding rows of several record types ("schemas")
//! at once. Every line starts with a prefix that says what the line is; most
//! lines then name the schema they belong to.
//!
//! ```text
//! ! Fruit and colors
//! Properties,Color,Id,Name
//! Values,Color,#,"Red"
//! Values,Color,#,"Yellow"
//!
//! Properties,Fruit,Id,Name,Color
//! Values,Fruit,#,"Banana",#Color("Yellow")
//! ```
//!
//! # Lines
//!
//! | Prefix | Shape | Meaning |
//! |--------|-------|---------|
//! | `Properties` | `Properties,<Schema>,<Name>,...` | Property names of a schema, exactly once per schema |
//! | `Values` | `Values,<Schema>,<Field>,...` | One row of a schema |
//! | `GlobalConfig` | `GlobalConfig,<Key>,<Value>` | Document-wide setting |
//! | `TypedConfig` | `TypedConfig,<Schema>,<Key>,<Value>` | Setting for one schema |
//! | `ConversionType` | `ConversionType,<Original>,<Converted>` | Schema rename |
//! | `ConversionValue` | `ConversionValue,<Original>,<Converted>` | Field value rename |
//! | declared metadata prefix | `<Prefix>,<Schema>,<Field>,...` | Metadata row |
//!
//! `Properties` and `Values` are defaults; both can be changed per document
//! (`PropertyPrefix`, `ValuesPrefix`) or per schema through `TypedConfig`.
//!
//! Blank lines and lines starting with a comment prefix (`!`, `#`, `;`, `//`,
//! `--` by default) are skipped. Lines with an unknown prefix are ignored.
//!
//! # Fields
//!
//! Fields are separated by `,` and trimmed. A field that starts with `"`
//! continues across commas until a fragment ends with `"`, so quoted text may
//! contain commas. There are no escapes; quoted text cannot contain `"`.
//!
//! ```rust
//! use serde_mtcsv::token::split_line;
//!
//! assert_eq!(
//!     split_line(r#"Values,Note,"Hello, world", 3"#),
//!     vec!["Values", "Note", "\"Hello, world\"", "3"]
//! );
//! ```
//!
//! Fields stay as raw text in a parsed document. They are only typed when
//! bound to a Rust type:
//!
//! | Raw field | Decoded as |
//! |-----------|------------|
//! | *(empty)* | null: `None`, `0`, `false` or `""` |
//! | `"text"` | string |
//! | `true`, `FALSE` | boolean |
//! | `42`, `-7` | integer |
//! | `2.5`, `1e3` | float |
//! | `Shape.Circle` | enumeration member `Circle` of `Shape` |
//! | anything else | string |
//!
//! # Configuration keys
//!
//! | Key | Global | Typed | Default |
//! |-----|--------|-------|---------|
//! | `PropertyPrefix` | yes | yes | `Properties` |
//! | `ValuesPrefix` | yes | yes | `Values` |
//! | `ReferenceIdColumnName` | yes | yes | `Id` |
//! | `ReferenceNameColumnName` | yes | yes | `Name` |
//! | `ConversionTypePrefix` | yes | no | `ConversionType` |
//! | `ConversionValuePrefix` | yes | no | `ConversionValue` |
//!
//! A typed setting beats a global one, which beats the value configured in
//! [`ParseOptions`](crate::ParseOptions). When a key is given twice at the
//! same level the first line wins. The property and value prefix of a schema
//! must differ.
//!
//! ```rust
//! use serde_mtcsv::parse;
//!
//! let document = parse(
//!     "GlobalConfig,ValuesPrefix,Row\n\
//!      TypedConfig,Bar,ValuesPrefix,Item\n\
//!      Properties,Foo,A\nRow,Foo,1\n\
//!      Properties,Bar,B\nItem,Bar,2",
//! )
//! .unwrap();
//!
//! assert_eq!(document.table("Foo").unwrap().rows, vec![vec!["1".to_string()]]);
//! assert_eq!(document.table("Bar").unwrap().rows, vec![vec!["2".to_string()]]);
//! ```
//!
//! # Sequences
//!
//! A field equal to the placeholder (`#`) receives the next number of its
//! schema's counter. Counters start at 1 and only advance on placeholders;
//! literal numbers are kept as written.
//!
//! ```rust
//! use serde_mtcsv::parse;
//!
//! let document = parse("Properties,Foo,Id\nValues,Foo,#\nValues,Foo,99\nValues,Foo,#").unwrap();
//! assert_eq!(document.table("Foo").unwrap().column("Id"), Some(vec!["1", "99", "2"]));
//! ```
//!
//! # References
//!
//! A field `#<Schema>(<Name>)` is replaced by the id of the first row of
//! `<Schema>` whose name column equals `<Name>`. The id and name columns are
//! `Id` and `Name` unless configured otherwise. Rows may reference schemas
//! defined later in the document. References that match nothing stay as
//! written.
//!
//! # Conversions
//!
//! Conversion lines are only applied when enabled in
//! [`ParseOptions`](crate::ParseOptions). Value conversion compares the
//! unquoted field and keeps its quotes. Type conversion renames the stored
//! schema; references may use either name.
//!
//! # Metadata
//!
//! Metadata rows are declared up front with a
//! [`MetadataDeclaration`](crate::MetadataDeclaration) naming a prefix, a
//! schema and the property names of the row. Mappings are plain name/value
//! pairs; structured rows and tags are bound to record types, and tags apply
//! to the schema as a whole rather than to its instances.
//!
//! # Writing
//!
//! [`Writer`](crate::Writer) emits CRLF line endings and a blank line after
//! each schema block. Strings are quoted, enumeration members are written as
//! `Type.Member` and `None` is an empty field.
