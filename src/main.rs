//! Snowflake MCP Server
//!
//! Serves read-only Snowflake query tools over stdio. Connection
//! parameters come from a named connections.toml profile (`-c`) or from
//! SNOWFLAKE_* environment variables.

use clap::Parser;
use rmcp::ServiceExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use snowflake_mcp::{ConnectionSource, SnowflakeMcpServer};

#[derive(Parser)]
#[command(name = "snowflake-mcp")]
#[command(about = "Read-only MCP server for Snowflake", version)]
struct Cli {
    /// Connection name from connections.toml (SNOWFLAKE_* environment
    /// variables are used when omitted)
    #[arg(short = 'c', long)]
    connection_name: Option<String>,
}

/// Set up logging to stderr (stdout is reserved for the MCP protocol).
/// Set `LOG_FORMAT=json` for structured JSON output.
fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("snowflake_mcp=info".parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let source = match cli.connection_name {
        Some(name) => ConnectionSource::Profile(name),
        None => ConnectionSource::Environment,
    };

    tracing::info!("Starting snowflake-mcp MCP Server ({})", source);

    let server = SnowflakeMcpServer::new(source);
    let connection = server.connection();
    let service = server.serve(rmcp::transport::stdio()).await?;

    tracing::info!("Server running, waiting for requests...");

    service.waiting().await?;

    connection.close().await;
    tracing::info!("Server shutting down");
    Ok(())
}
