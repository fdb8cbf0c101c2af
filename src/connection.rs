//! Connection lifecycle and statement execution
//!
//! [`ConnectionParams`] builds the driver parameter set from environment
//! variables or a named connections.toml profile. [`SnowflakeConnection`]
//! owns one lazily-opened session, executes statements through it, and
//! shapes tabular results into keyed rows.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;

use crate::config::{self, ConnectionProfile};
use crate::driver::{Driver, DriverSession, QueryOutput};
use crate::types::{ConnectionSource, ResultRow, SnowflakeError};

// ============================================================================
// Connection Parameters
// ============================================================================

/// Parameter set handed to the driver when opening a session.
///
/// Optional fields that are unset are omitted entirely, never passed as
/// empty strings.
#[derive(Debug, Clone, Default)]
pub struct ConnectionParams {
    pub account: String,
    pub user: String,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub warehouse: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
    /// Unencrypted PKCS#8 DER private key for key-pair auth
    pub private_key: Option<Vec<u8>>,
    pub token: Option<String>,
    pub authenticator: Option<String>,
}

impl ConnectionParams {
    /// Build parameters from SNOWFLAKE_* environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build parameters from an injectable variable lookup.
    ///
    /// Set-but-empty values count as unset. Key-pair material is added
    /// first, then OAuth fields; the two auth paths are independent and
    /// may both be present.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let mut params = Self {
            account: var("SNOWFLAKE_ACCOUNT").context("SNOWFLAKE_ACCOUNT is not set")?,
            user: var("SNOWFLAKE_USER").context("SNOWFLAKE_USER is not set")?,
            database: var("SNOWFLAKE_DATABASE"),
            schema: var("SNOWFLAKE_SCHEMA"),
            warehouse: var("SNOWFLAKE_WAREHOUSE"),
            role: var("SNOWFLAKE_ROLE"),
            ..Self::default()
        };

        if let Some(path) = var("SNOWFLAKE_PRIVATE_KEY_PATH") {
            let passphrase = var("SNOWFLAKE_PRIVATE_KEY_PASSPHRASE");
            params.private_key = Some(load_private_key(
                Path::new(&path),
                passphrase.as_deref(),
            )?);
        }

        if let Some(token) = var("SNOWFLAKE_OAUTH_TOKEN") {
            params.token = Some(token);
            params.authenticator = Some("oauth".to_string());
        }

        Ok(params)
    }

    /// Build parameters from a named connections.toml profile
    pub fn from_profile(profile: ConnectionProfile) -> Result<Self> {
        let mut params = Self {
            account: profile.account,
            user: profile.user,
            database: profile.database,
            schema: profile.schema,
            warehouse: profile.warehouse,
            role: profile.role,
            password: profile.password,
            ..Self::default()
        };

        if let Some(path) = profile.private_key_path {
            params.private_key = Some(load_private_key(
                &path,
                profile.private_key_passphrase.as_deref(),
            )?);
        }

        if let Some(token) = profile.oauth_token {
            params.token = Some(token);
            params.authenticator = Some("oauth".to_string());
        }

        Ok(params)
    }
}

/// Read a PEM private key, decrypting it when a passphrase is given, and
/// re-encode it as unencrypted PKCS#8 DER.
fn load_private_key(path: &Path, passphrase: Option<&str>) -> Result<Vec<u8>> {
    use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};

    let pem = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read private key from {:?}", path))?;

    let key = match passphrase {
        Some(passphrase) if !passphrase.is_empty() => {
            rsa::RsaPrivateKey::from_pkcs8_encrypted_pem(&pem, passphrase.as_bytes())
                .context("Failed to decrypt private key")?
        }
        _ => rsa::RsaPrivateKey::from_pkcs8_pem(&pem).context("Failed to parse private key")?,
    };

    let der = key
        .to_pkcs8_der()
        .context("Failed to re-encode private key")?;

    Ok(der.as_bytes().to_vec())
}

// ============================================================================
// Connection Handle
// ============================================================================

/// Lazily-connected handle to one Snowflake session.
///
/// The session slot doubles as the statement lock: at most one statement
/// is in flight per handle, with no reconnect or retry on failure.
pub struct SnowflakeConnection {
    driver: Arc<dyn Driver>,
    source: ConnectionSource,
    session: Mutex<Option<Box<dyn DriverSession>>>,
}

impl SnowflakeConnection {
    pub fn new(driver: Arc<dyn Driver>, source: ConnectionSource) -> Self {
        Self {
            driver,
            source,
            session: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &ConnectionSource {
        &self.source
    }

    /// Open the session now instead of on first execute
    pub async fn connect(&self) -> Result<(), SnowflakeError> {
        let mut slot = self.session.lock().await;
        if slot.is_none() {
            *slot = Some(self.open_session().await?);
        }
        Ok(())
    }

    /// Execute a statement and shape its result into keyed rows.
    ///
    /// Connects lazily on first use. A statement failure propagates as
    /// [`SnowflakeError::Execution`] and leaves the session in place.
    /// Zero matching rows yield an empty vector, not an error.
    pub async fn execute_query(&self, sql: &str) -> Result<Vec<ResultRow>, SnowflakeError> {
        let mut slot = self.session.lock().await;

        let output = if let Some(session) = slot.as_deref() {
            session.query(sql).await
        } else {
            let session = self.open_session().await?;
            let output = session.query(sql).await;
            *slot = Some(session);
            output
        }
        .map_err(|cause| SnowflakeError::Execution { cause })?;

        Ok(shape_rows(output))
    }

    /// Drop the live session, if any. Closing twice is a no-op.
    pub async fn close(&self) {
        self.session.lock().await.take();
    }

    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.is_some()
    }

    async fn open_session(&self) -> Result<Box<dyn DriverSession>, SnowflakeError> {
        let params = match &self.source {
            ConnectionSource::Profile(name) => {
                config::load_profile(name).and_then(ConnectionParams::from_profile)
            }
            ConnectionSource::Environment => ConnectionParams::from_env(),
        }
        .map_err(|cause| SnowflakeError::Connection {
            mode: self.source.clone(),
            cause,
        })?;

        self.driver
            .connect(&params)
            .await
            .map_err(|cause| SnowflakeError::Connection {
                mode: self.source.clone(),
                cause,
            })
    }
}

/// Zip the ordered column names with each tuple into a keyed row.
/// Duplicate column names resolve last-value-wins.
fn shape_rows(output: QueryOutput) -> Vec<ResultRow> {
    output
        .rows
        .into_iter()
        .map(|tuple| {
            let mut row = ResultRow::new();
            for (column, value) in output.columns.iter().zip(tuple) {
                row.insert(column.clone(), value);
            }
            row
        })
        .collect()
}
