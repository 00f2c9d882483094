//! Line tokenizer.
//!
//! Lines are split on every comma first. Fragments that were cut inside a
//! double-quoted field are then glued back together, and only afterwards is
//! surrounding whitespace trimmed, so spaces next to a quoted comma survive.
//!
//! Escaped quotes inside quoted fields are not supported.
//!
//! ```rust
//! use serde_mtcsv::token::split_line;
//!
//! let fields = split_line(r#"Values,Foo,1,"Name, with a comma""#);
//! assert_eq!(fields, vec!["Values", "Foo", "1", "\"Name, with a comma\""]);
//! ```

/// Field separator.
pub const DELIMITER: char = ',';

/// Splits `line` into trimmed fields, re-joining quoted fields that contain commas.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fragments: Vec<String> = line.split(DELIMITER).map(str::to_string).collect();

    let mut i = 0;
    while i < fragments.len() {
        // A fragment that opens a quote but doesn't close it swallows its successor.
        while opens_unbalanced(&fragments[i]) && i + 1 < fragments.len() {
            let next = fragments.remove(i + 1);
            let joined = &mut fragments[i];
            joined.push(DELIMITER);
            joined.push_str(&next);
        }
        i += 1;
    }

    fragments
        .into_iter()
        .map(|fragment| fragment.trim().to_string())
        .collect()
}

fn opens_unbalanced(fragment: &str) -> bool {
    let trimmed = fragment.trim();
    trimmed.starts_with('"') && !(trimmed.len() > 1 && trimmed.ends_with('"'))
}

/// Returns `true` if `field` is wrapped in double quotes.
#[inline]
#[must_use]
pub fn is_quoted(field: &str) -> bool {
    field.len() >= 2 && field.starts_with('"') && field.ends_with('"')
}

/// Strips one pair of surrounding double quotes, if present.
///
/// ```rust
/// use serde_mtcsv::token::unquote;
///
/// assert_eq!(unquote("\"Alpha\""), "Alpha");
/// assert_eq!(unquote("Alpha"), "Alpha");
/// assert_eq!(unquote("\"\""), "");
/// ```
#[must_use]
pub fn unquote(field: &str) -> &str {
    if is_quoted(field) {
        &field[1..field.len() - 1]
    } else {
        field
    }
}

/// Joins already-formatted fields into one line.
pub fn join_fields<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            line.push(DELIMITER);
        }
        line.push_str(field.as_ref());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_split_trims() {
        assert_eq!(
            split_line(" Properties , Foo ,Id, Name "),
            vec!["Properties", "Foo", "Id", "Name"]
        );
    }

    #[test]
    fn test_rejoin_quoted_comma() {
        assert_eq!(
            split_line(r#"Values,Foo,1,"Name, with a comma""#),
            vec!["Values", "Foo", "1", r#""Name, with a comma""#]
        );
    }

    #[test]
    fn test_rejoin_keeps_interior_spaces() {
        assert_eq!(split_line(r#"a,"x , y ",b"#), vec!["a", r#""x , y ""#, "b"]);
    }

    #[test]
    fn test_rejoin_spanning_several_commas() {
        assert_eq!(split_line(r#""a,b,c",d"#), vec![r#""a,b,c""#, "d"]);
    }

    #[test]
    fn test_unterminated_quote_swallows_rest() {
        assert_eq!(split_line(r#"a,"b,c"#), vec!["a", r#""b,c"#]);
    }

    #[test]
    fn test_lone_quote_field() {
        assert_eq!(split_line("a,\",b"), vec!["a", "\",b"]);
    }

    #[test]
    fn test_empty_fields_kept() {
        assert_eq!(split_line("a,,b,"), vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_join_fields() {
        assert_eq!(join_fields(["a", "b", "\"c\""]), "a,b,\"c\"");
        assert_eq!(join_fields(Vec::<String>::new()), "");
    }
}
