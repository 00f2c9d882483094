//! Line classification.
//!
//! A document is first reduced to [`Lines`]: every non-blank, non-comment
//! line, tokenized once. [`classify`] then selects lines by their prefix
//! (first field) and optionally by schema name (second field), which is all
//! the engine needs to pick out configuration, conversion, property, value
//! and metadata lines.

use crate::token::split_line;
use indexmap::IndexSet;

/// A tokenized, comment-free document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lines {
    lines: Vec<Vec<String>>,
}

impl Lines {
    /// Tokenizes `input`, dropping blank lines and lines starting with any of `comment_prefixes`.
    ///
    /// ```rust
    /// use serde_mtcsv::classify::Lines;
    ///
    /// let lines = Lines::parse("! header\r\n\r\nValues,Foo,1\n// note", &["!", "//"]);
    /// assert_eq!(lines.len(), 1);
    /// ```
    pub fn parse<S: AsRef<str>>(input: &str, comment_prefixes: &[S]) -> Self {
        let lines = input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| {
                !comment_prefixes
                    .iter()
                    .any(|prefix| !prefix.as_ref().is_empty() && line.starts_with(prefix.as_ref()))
            })
            .map(split_line)
            .collect();
        Lines { lines }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vec<String>> {
        self.lines.iter()
    }
}

impl From<Vec<Vec<String>>> for Lines {
    fn from(lines: Vec<Vec<String>>) -> Self {
        Lines { lines }
    }
}

/// Selects the lines whose prefix is one of `prefixes` and, when given, whose
/// schema column equals `schema`.
///
/// The returned rows have the prefix column stripped, plus the schema column
/// when `schema` is given. Lines too short to carry the requested columns are skipped.
///
/// ```rust
/// use serde_mtcsv::classify::{classify, Lines};
///
/// let lines = Lines::parse("Values,Foo,1\nValues,Bar,2\nProperties,Foo,Id", &["!"]);
/// assert_eq!(classify(&lines, &["Values"], Some("Foo")), vec![vec!["1".to_string()]]);
/// assert_eq!(classify(&lines, &["Values"], None).len(), 2);
/// ```
pub fn classify<S: AsRef<str>>(
    lines: &Lines,
    prefixes: &[S],
    schema: Option<&str>,
) -> Vec<Vec<String>> {
    let skip = if schema.is_some() { 2 } else { 1 };
    lines
        .iter()
        .filter(|fields| fields.len() >= skip)
        .filter(|fields| prefixes.iter().any(|p| p.as_ref() == fields[0]))
        .filter(|fields| schema.map_or(true, |schema| fields[1] == schema))
        .map(|fields| fields[skip..].to_vec())
        .collect()
}

/// Returns the distinct schema names (second column) of lines whose prefix is
/// not one of `excluded`, in order of first appearance.
pub fn schema_names<S: AsRef<str>>(lines: &Lines, excluded: &[S]) -> IndexSet<String> {
    lines
        .iter()
        .filter(|fields| fields.len() >= 2 && !fields[1].is_empty())
        .filter(|fields| !excluded.iter().any(|p| p.as_ref() == fields[0]))
        .map(|fields| fields[1].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMENTS: [&str; 5] = ["!", "#", ";", "//", "--"];

    fn sample() -> Lines {
        Lines::parse(
            "# comment\n\
             Properties,Foo,Id,Name\n\
             ; another comment\n\
             Values,Foo,1,\"A\"\n\
             \n\
             Values,Bar,2\n\
             -- trailing\n\
             GlobalConfig,PropertyPrefix,Props",
            &COMMENTS,
        )
    }

    #[test]
    fn test_comments_and_blanks_dropped() {
        assert_eq!(sample().len(), 4);
    }

    #[test]
    fn test_classify_by_prefix_and_schema() {
        let rows = classify(&sample(), &["Values"], Some("Foo"));
        assert_eq!(rows, vec![vec!["1".to_string(), "\"A\"".to_string()]]);
    }

    #[test]
    fn test_classify_without_schema_strips_prefix_only() {
        let rows = classify(&sample(), &["GlobalConfig"], None);
        assert_eq!(
            rows,
            vec![vec!["PropertyPrefix".to_string(), "Props".to_string()]]
        );
    }

    #[test]
    fn test_classify_accepts_several_prefixes() {
        let rows = classify(&sample(), &["Values", "Properties"], Some("Foo"));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_schema_names_in_document_order() {
        let names = schema_names(&sample(), &["GlobalConfig"]);
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["Foo", "Bar"]);
    }

    #[test]
    fn test_empty_comment_prefix_ignored() {
        let lines = Lines::parse("Values,Foo,1", &[""]);
        assert_eq!(lines.len(), 1);
    }
}
