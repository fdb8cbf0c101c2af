//! Tool parameter types

use schemars::JsonSchema;
use serde::Deserialize;

/// Parameters for the `query` tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryParams {
    #[schemars(
        description = "Read-only SQL statement to execute. Must start with SELECT, SHOW, DESCRIBE, DESC, or EXPLAIN."
    )]
    pub sql: String,
}

/// Parameters for the `describe_table` tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DescribeTableParams {
    #[schemars(description = "Name of the table to describe")]
    pub table_name: String,
}
