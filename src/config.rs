//! Named connection profiles
//!
//! Resolves entries from a `connections.toml` profile store, searched in:
//! 1. `$SNOWFLAKE_HOME/connections.toml`
//! 2. `~/.snowflake/connections.toml`
//! 3. `<config dir>/snowflake/connections.toml`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// One named entry in connections.toml
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionProfile {
    pub account: String,
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
    #[serde(default)]
    pub private_key_passphrase: Option<String>,
    #[serde(default)]
    pub oauth_token: Option<String>,
}

/// Load a named profile from the first connections.toml found
pub fn load_profile(name: &str) -> Result<ConnectionProfile> {
    let path = find_connections_file().context(
        "No connections.toml found in SNOWFLAKE_HOME, ~/.snowflake, or the config directory",
    )?;
    load_profile_from(&path, name)
}

/// Load a named profile from an explicit connections.toml path
pub fn load_profile_from(path: &Path, name: &str) -> Result<ConnectionProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read connections file {:?}", path))?;

    let profiles = parse_profiles(&content)
        .with_context(|| format!("Failed to parse connections file {:?}", path))?;

    profiles
        .get(name)
        .cloned()
        .with_context(|| format!("Connection '{}' not found in {:?}", name, path))
}

/// Parse the full profile table from connections.toml content
pub fn parse_profiles(content: &str) -> Result<HashMap<String, ConnectionProfile>> {
    Ok(toml::from_str(content)?)
}

fn find_connections_file() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(snowflake_home) = std::env::var("SNOWFLAKE_HOME") {
        candidates.push(PathBuf::from(snowflake_home).join("connections.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".snowflake").join("connections.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("snowflake").join("connections.toml"));
    }

    candidates.into_iter().find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[prod]
account = "myorg-prod"
user = "reporting"
warehouse = "REPORTING_WH"
database = "ANALYTICS"
schema = "PUBLIC"
role = "REPORTER"
private_key_path = "/etc/snowflake/rsa_key.p8"

[dev]
account = "myorg-dev"
user = "dev"
password = "hunter2"
"#;

    #[test]
    fn parses_multiple_profiles() {
        let profiles = parse_profiles(SAMPLE).unwrap();
        assert_eq!(profiles.len(), 2);

        let prod = &profiles["prod"];
        assert_eq!(prod.account, "myorg-prod");
        assert_eq!(prod.user, "reporting");
        assert_eq!(prod.warehouse.as_deref(), Some("REPORTING_WH"));
        assert_eq!(
            prod.private_key_path.as_deref(),
            Some(Path::new("/etc/snowflake/rsa_key.p8"))
        );
        assert!(prod.password.is_none());

        let dev = &profiles["dev"];
        assert_eq!(dev.password.as_deref(), Some("hunter2"));
        assert!(dev.warehouse.is_none());
    }

    #[test]
    fn load_profile_from_reads_named_entry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let profile = load_profile_from(file.path(), "dev").unwrap();
        assert_eq!(profile.account, "myorg-dev");
    }

    #[test]
    fn missing_profile_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let err = load_profile_from(file.path(), "staging").unwrap_err();
        assert!(err.to_string().contains("'staging' not found"));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[broken\naccount = ").unwrap();

        let err = load_profile_from(file.path(), "broken").unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
