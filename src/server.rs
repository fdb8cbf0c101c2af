//! MCP server implementation for read-only Snowflake access
//!
//! Exposes four tools over one lazily-opened connection. Free-form SQL
//! passes through the read-only gate before anything touches the wire;
//! the fixed statements are issued verbatim.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    ErrorData as McpError,
};
use serde::Serialize;

use crate::connection::SnowflakeConnection;
use crate::driver::{Driver, RestDriver};
use crate::params::{DescribeTableParams, QueryParams};
use crate::types::{ConnectionSource, ResultRow, SnowflakeError};
use crate::validator::QueryValidator;

/// The Snowflake MCP Server
#[derive(Clone)]
pub struct SnowflakeMcpServer {
    connection: Arc<SnowflakeConnection>,
    validator: QueryValidator,
    tool_router: ToolRouter<Self>,
}

impl SnowflakeMcpServer {
    /// Create a server backed by the REST driver
    pub fn new(source: ConnectionSource) -> Self {
        Self::with_driver(Arc::new(RestDriver::new()), source)
    }

    /// Create a server with an injected driver
    pub fn with_driver(driver: Arc<dyn Driver>, source: ConnectionSource) -> Self {
        Self::with_connection(Arc::new(SnowflakeConnection::new(driver, source)))
    }

    /// Create a server around an existing connection handle
    pub fn with_connection(connection: Arc<SnowflakeConnection>) -> Self {
        Self {
            connection,
            validator: QueryValidator::new(),
            tool_router: Self::tool_router(),
        }
    }

    /// Shared connection handle, e.g. for closing at shutdown
    pub fn connection(&self) -> Arc<SnowflakeConnection> {
        Arc::clone(&self.connection)
    }

    /// Gate a free-form statement, then execute it. The gate runs before
    /// any connection is acquired.
    async fn run_query(&self, sql: &str) -> Result<Vec<ResultRow>, SnowflakeError> {
        if !self.validator.is_read_only(Some(sql)) {
            return Err(SnowflakeError::ReadOnly);
        }
        self.connection.execute_query(sql).await
    }
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl SnowflakeMcpServer {
    #[tool(
        description = "Execute a read-only SQL query on Snowflake. Only SELECT, SHOW, DESCRIBE, DESC, and EXPLAIN statements are allowed."
    )]
    async fn query(
        &self,
        Parameters(params): Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.run_query(&params.sql).await {
            Ok(rows) => json_success(&rows),
            Err(err @ SnowflakeError::ReadOnly) => {
                Err(McpError::invalid_params(err.to_string(), None))
            }
            Err(err) => Err(McpError::internal_error(
                format!("Query execution failed: {}", err),
                None,
            )),
        }
    }

    #[tool(description = "List all tables in the current schema")]
    async fn list_tables(&self) -> Result<CallToolResult, McpError> {
        match self.connection.execute_query("SHOW TABLES").await {
            Ok(rows) => json_success(&rows),
            Err(err) => Err(McpError::internal_error(
                format!("Failed to list tables: {}", err),
                None,
            )),
        }
    }

    #[tool(description = "Describe the structure of a table")]
    async fn describe_table(
        &self,
        Parameters(params): Parameters<DescribeTableParams>,
    ) -> Result<CallToolResult, McpError> {
        // The identifier is interpolated as-is; quoting is the caller's
        // responsibility.
        let sql = format!("DESCRIBE TABLE {}", params.table_name);
        match self.connection.execute_query(&sql).await {
            Ok(rows) => json_success(&rows),
            Err(err) => Err(McpError::internal_error(
                format!("Failed to describe table: {}", err),
                None,
            )),
        }
    }

    #[tool(description = "Get information about the current schema")]
    async fn get_schema(&self) -> Result<CallToolResult, McpError> {
        match self.connection.execute_query("DESCRIBE SCHEMA").await {
            Ok(rows) => json_success(&rows),
            Err(err) => Err(McpError::internal_error(
                format!("Failed to get schema: {}", err),
                None,
            )),
        }
    }
}

/// Serialize data as a pretty-printed JSON text content block
fn json_success<T: Serialize>(data: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for SnowflakeMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Read-only Snowflake MCP server. Use query for SELECT, SHOW, DESCRIBE, \
                 DESC, and EXPLAIN statements, list_tables to enumerate tables in the \
                 current schema, describe_table to inspect a table's structure, and \
                 get_schema for information about the current schema. Write statements \
                 are rejected."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
