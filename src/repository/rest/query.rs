//! PostgREST query strings

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt::Display;

/// Characters left as-is in query values
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Filter/modifier builder for a table request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_string(), value));
        self
    }

    pub fn select(self, columns: &str) -> Self {
        self.push("select", columns.to_string())
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.push(column, format!("eq.{}", value))
    }

    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.push(column, format!("neq.{}", value))
    }

    /// Case-insensitive pattern match, `%` as wildcard
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.push(column, format!("ilike.{}", pattern))
    }

    /// Disjunction of raw filters, e.g. `requester.eq.a,addressee.eq.a`
    pub fn or(self, filters: &str) -> Self {
        self.push("or", format!("({})", filters))
    }

    pub fn order(self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.push("order", format!("{}.{}", column, direction))
    }

    pub fn limit(self, n: usize) -> Self {
        self.push("limit", n.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Encoded `key=value&...` form
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(key, QUERY_VALUE),
                    utf8_percent_encode(value, QUERY_VALUE)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}
