//! Shared types for the Snowflake MCP server

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// One result tuple as an ordered column-name to value mapping.
///
/// `serde_json`'s map keeps insertion order (the `preserve_order`
/// feature), so columns serialize in result-descriptor order. Duplicate
/// column names collapse to the last value written.
pub type ResultRow = serde_json::Map<String, Value>;

// ============================================================================
// Connection Source
// ============================================================================

/// How connection parameters are acquired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSource {
    /// A named entry in connections.toml
    Profile(String),
    /// SNOWFLAKE_* environment variables
    Environment,
}

impl fmt::Display for ConnectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionSource::Profile(name) => {
                write!(f, "connections.toml connection name '{}'", name)
            }
            ConnectionSource::Environment => {
                write!(f, "environment variable-based parameters")
            }
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors raised by the query gateway
#[derive(Debug, Error)]
pub enum SnowflakeError {
    /// A free-form statement failed the read-only prefix check. Raised
    /// before any I/O; the rejected SQL is not echoed back.
    #[error("Only read-only queries are allowed")]
    ReadOnly,

    /// Connection acquisition failed. The message names the acquisition
    /// mode that was attempted; `{:#}` keeps the full cause chain.
    #[error("Failed to connect using {mode}. Original error: {cause:#}")]
    Connection {
        mode: ConnectionSource,
        cause: anyhow::Error,
    },

    /// Statement execution failed on a live session. The operation-specific
    /// prefix is added once at the tool boundary.
    #[error("{cause:#}")]
    Execution { cause: anyhow::Error },
}
