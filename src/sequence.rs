//! Per-schema counters for the placeholder token.
//!
//! A tracker lives for exactly one parse run. Every counter starts at 1 and
//! only moves when a placeholder is consumed; explicit values never touch it.
//!
//! ```rust
//! use serde_mtcsv::sequence::SequenceTracker;
//!
//! let mut tracker = SequenceTracker::new("#");
//! tracker.initialize(["Foo"]);
//! assert_eq!(tracker.assign("Foo", "#"), "1");
//! assert_eq!(tracker.assign("Foo", "99"), "99");
//! assert_eq!(tracker.assign("Foo", " # "), "2");
//! ```

use indexmap::IndexMap;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceTracker {
    placeholder: String,
    counters: IndexMap<String, u64>,
}

impl SequenceTracker {
    #[must_use]
    pub fn new(placeholder: impl Into<String>) -> Self {
        SequenceTracker {
            placeholder: placeholder.into(),
            counters: IndexMap::new(),
        }
    }

    /// Starts a counter at 1 for each schema that doesn't have one yet.
    pub fn initialize<I, S>(&mut self, schemas: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for schema in schemas {
            self.counters
                .entry(schema.as_ref().to_string())
                .or_insert(1);
        }
    }

    /// Returns the current value for `schema`, then increments it.
    pub fn next(&mut self, schema: &str) -> u64 {
        let counter = self.counters.entry(schema.to_string()).or_insert(1);
        let value = *counter;
        *counter += 1;
        value
    }

    /// The value the next placeholder of `schema` would receive.
    #[must_use]
    pub fn peek(&self, schema: &str) -> Option<u64> {
        self.counters.get(schema).copied()
    }

    #[must_use]
    pub fn is_placeholder(&self, field: &str) -> bool {
        field.trim() == self.placeholder
    }

    /// Replaces `field` with the next value for `schema` if it is the placeholder.
    pub fn assign(&mut self, schema: &str, field: &str) -> String {
        if self.is_placeholder(field) {
            let value = self.next(schema);
            trace!(%schema, value, "assigned sequence value");
            value.to_string()
        } else {
            field.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_per_schema() {
        let mut tracker = SequenceTracker::new("#");
        assert_eq!(tracker.next("A"), 1);
        assert_eq!(tracker.next("A"), 2);
        assert_eq!(tracker.next("B"), 1);
        assert_eq!(tracker.peek("A"), Some(3));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut tracker = SequenceTracker::new("#");
        tracker.initialize(["A"]);
        tracker.next("A");
        tracker.initialize(["A", "B"]);
        assert_eq!(tracker.peek("A"), Some(2));
        assert_eq!(tracker.peek("B"), Some(1));
    }

    #[test]
    fn test_explicit_values_bypass_counter() {
        let mut tracker = SequenceTracker::new("#");
        let fields: Vec<String> = ["#", "99", "#", "\"#\"", "#"]
            .iter()
            .map(|f| tracker.assign("Foo", f))
            .collect();
        assert_eq!(fields, vec!["1", "99", "2", "\"#\"", "3"]);
    }

    #[test]
    fn test_custom_placeholder() {
        let mut tracker = SequenceTracker::new("<auto>");
        assert_eq!(tracker.assign("Foo", "#"), "#");
        assert_eq!(tracker.assign("Foo", "<auto>"), "1");
    }
}
