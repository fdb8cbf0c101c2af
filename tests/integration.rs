//! Integration tests for the Snowflake MCP server
//!
//! These tests run against a real Snowflake account. They require:
//! - SNOWFLAKE_ACCOUNT and SNOWFLAKE_USER in the environment
//! - key-pair credentials (SNOWFLAKE_PRIVATE_KEY_PATH, optionally
//!   SNOWFLAKE_PRIVATE_KEY_PASSPHRASE)
//!
//! # Running tests
//!
//! ```bash
//! cargo test --test integration -- --ignored
//! ```

use std::sync::Arc;

use snowflake_mcp::{ConnectionSource, RestDriver, SnowflakeConnection};

/// Check if warehouse credentials are present
fn credentials_available() -> bool {
    std::env::var("SNOWFLAKE_ACCOUNT").is_ok()
        && std::env::var("SNOWFLAKE_USER").is_ok()
        && std::env::var("SNOWFLAKE_PRIVATE_KEY_PATH").is_ok()
}

fn live_connection() -> SnowflakeConnection {
    SnowflakeConnection::new(Arc::new(RestDriver::new()), ConnectionSource::Environment)
}

#[tokio::test]
#[ignore = "integration test - requires Snowflake credentials and network"]
async fn select_round_trip() {
    if !credentials_available() {
        eprintln!("Skipping: SNOWFLAKE_* credentials not set");
        return;
    }

    let connection = live_connection();
    let rows = connection
        .execute_query("SELECT 1 AS ONE, 'two' AS TWO")
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert!(rows[0].contains_key("ONE"));
    assert!(rows[0].contains_key("TWO"));

    connection.close().await;
}

#[tokio::test]
#[ignore = "integration test - requires Snowflake credentials and network"]
async fn show_tables_round_trip() {
    if !credentials_available() {
        eprintln!("Skipping: SNOWFLAKE_* credentials not set");
        return;
    }

    let connection = live_connection();
    // SHOW TABLES is valid even against an empty schema
    connection.execute_query("SHOW TABLES").await.unwrap();
    connection.close().await;
}

#[tokio::test]
#[ignore = "integration test - requires Snowflake credentials and network"]
async fn zero_row_select_yields_empty_result() {
    if !credentials_available() {
        eprintln!("Skipping: SNOWFLAKE_* credentials not set");
        return;
    }

    let connection = live_connection();
    let rows = connection
        .execute_query("SELECT 1 AS ONE WHERE 1 = 0")
        .await
        .unwrap();

    assert!(rows.is_empty());
    connection.close().await;
}
