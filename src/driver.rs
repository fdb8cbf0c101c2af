//! Warehouse driver seam
//!
//! The gateway consumes the Snowflake connector through these narrow
//! traits so tests can substitute a scripted driver. [`RestDriver`] is
//! the production implementation, backed by `snowflake-connector-rs`.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use snowflake_connector_rs::{
    SnowflakeAuthMethod, SnowflakeClient, SnowflakeClientConfig, SnowflakeSession,
};

use crate::connection::ConnectionParams;

/// Tabular output of one statement: result-descriptor column order plus
/// row tuples in the same order.
#[derive(Debug, Clone, Default)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Opens sessions against the warehouse
#[async_trait]
pub trait Driver: Send + Sync {
    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn DriverSession>>;
}

/// One live warehouse session. Statement handles are scoped inside
/// `query` and released on every exit path before it returns.
#[async_trait]
pub trait DriverSession: Send + Sync {
    async fn query(&self, sql: &str) -> Result<QueryOutput>;
}

// ============================================================================
// REST driver
// ============================================================================

/// Production driver over the Snowflake REST connector
#[derive(Debug, Clone, Default)]
pub struct RestDriver;

impl RestDriver {
    pub fn new() -> Self {
        Self
    }

    /// Pick the authentication method from the parameter set. Key-pair
    /// material wins when both auth paths are present.
    fn auth_method(params: &ConnectionParams) -> Result<SnowflakeAuthMethod> {
        if let Some(der) = &params.private_key {
            // The parameter set carries unencrypted PKCS#8 DER; the
            // connector consumes PEM.
            let pem = pem::encode(&pem::Pem::new("PRIVATE KEY", der.clone()));
            return Ok(SnowflakeAuthMethod::KeyPair {
                encrypted_pem: pem,
                password: Vec::new(),
            });
        }

        if let Some(password) = &params.password {
            return Ok(SnowflakeAuthMethod::Password(password.clone()));
        }

        if params.token.is_some() {
            return Err(anyhow!(
                "OAuth authentication is not supported by the REST driver"
            ));
        }

        Err(anyhow!("No authentication method configured"))
    }
}

#[async_trait]
impl Driver for RestDriver {
    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn DriverSession>> {
        let auth = Self::auth_method(params)?;

        let client = SnowflakeClient::new(
            params.user.as_str(),
            auth,
            SnowflakeClientConfig {
                account: params.account.clone(),
                role: params.role.clone(),
                warehouse: params.warehouse.clone(),
                database: params.database.clone(),
                schema: params.schema.clone(),
                timeout: None,
            },
        )
        .context("Failed to build Snowflake client")?;

        let session = client
            .create_session()
            .await
            .context("Failed to open Snowflake session")?;

        Ok(Box::new(RestSession { session }))
    }
}

struct RestSession {
    session: SnowflakeSession,
}

#[async_trait]
impl DriverSession for RestSession {
    async fn query(&self, sql: &str) -> Result<QueryOutput> {
        let rows = self.session.query(sql).await?;

        let columns: Vec<String> = match rows.first() {
            Some(row) => row.column_names().iter().map(|c| c.to_string()).collect(),
            None => return Ok(QueryOutput::default()),
        };

        let mut shaped = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut tuple = Vec::with_capacity(columns.len());
            for name in &columns {
                let value: Option<String> = row.get(name)?;
                tuple.push(value.map(Value::String).unwrap_or(Value::Null));
            }
            shaped.push(tuple);
        }

        Ok(QueryOutput {
            columns,
            rows: shaped,
        })
    }
}

// ============================================================================
// Test driver
// ============================================================================

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Scripted driver that records executed statements
    #[derive(Default)]
    pub struct MockDriver {
        output: QueryOutput,
        connect_error: Option<String>,
        query_error: Option<String>,
        pub executed: Arc<Mutex<Vec<String>>>,
        pub connects: Arc<AtomicUsize>,
    }

    impl MockDriver {
        pub fn returning(output: QueryOutput) -> Self {
            Self {
                output,
                ..Self::default()
            }
        }

        pub fn failing_connect(message: &str) -> Self {
            Self {
                connect_error: Some(message.to_string()),
                ..Self::default()
            }
        }

        pub fn failing_query(message: &str) -> Self {
            Self {
                query_error: Some(message.to_string()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Driver for MockDriver {
        async fn connect(&self, _params: &ConnectionParams) -> Result<Box<dyn DriverSession>> {
            if let Some(message) = &self.connect_error {
                return Err(anyhow!("{}", message));
            }

            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockSession {
                output: self.output.clone(),
                query_error: self.query_error.clone(),
                executed: Arc::clone(&self.executed),
            }))
        }
    }

    struct MockSession {
        output: QueryOutput,
        query_error: Option<String>,
        executed: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl DriverSession for MockSession {
        async fn query(&self, sql: &str) -> Result<QueryOutput> {
            self.executed.lock().unwrap().push(sql.to_string());

            if let Some(message) = &self.query_error {
                return Err(anyhow!("{}", message));
            }

            Ok(self.output.clone())
        }
    }
}
