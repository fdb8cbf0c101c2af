//! Read-only statement gate
//!
//! Classifies SQL text by its leading keyword against a fixed allow-list.
//! This is a prefix check, not a parser: leading comments or any other
//! non-keyword prefix fail closed.

/// Statement keywords considered read-only.
pub const READ_ONLY_PREFIXES: [&str; 5] = ["SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN"];

/// Prefix-based read-only classifier for SQL statements
#[derive(Debug, Clone)]
pub struct QueryValidator {
    prefixes: Vec<String>,
}

impl QueryValidator {
    /// Create a validator with the default read-only prefix set
    pub fn new() -> Self {
        Self::with_prefixes(READ_ONLY_PREFIXES.iter().map(|p| p.to_string()).collect())
    }

    /// Create a validator with a custom prefix set. Matching happens on
    /// upper-cased statement text, so prefixes are upper-cased here.
    pub fn with_prefixes(prefixes: Vec<String>) -> Self {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.to_ascii_uppercase())
                .collect(),
        }
    }

    /// Check whether a statement is read-only.
    ///
    /// Absent, empty, and whitespace-only input is not read-only.
    /// Otherwise the statement is trimmed, upper-cased (ASCII only, no
    /// locale-sensitive casing), and accepted iff it starts with one of
    /// the configured keywords. The match is on the literal start of the
    /// string: "EXPLAINER" matches the "EXPLAIN" prefix, while a SELECT
    /// hidden behind a leading comment does not match anything.
    pub fn is_read_only(&self, query: Option<&str>) -> bool {
        let Some(query) = query else {
            return false;
        };

        let normalized = query.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return false;
        }

        self.prefixes
            .iter()
            .any(|prefix| normalized.starts_with(prefix.as_str()))
    }
}

impl Default for QueryValidator {
    fn default() -> Self {
        Self::new()
    }
}
