//! Credential configuration — the JSON file consulted before every execution.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CourierError, Result};

/// Root credentials structure (`credentials.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub db: DbConfig,
    pub email: SmtpConfig,
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub username: String,
    pub password: String,
    pub server: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub database: String,
    /// Accept the server certificate without verification. A development
    /// convenience carried over from the original deployments; leave it off
    /// anywhere that matters.
    #[serde(default = "bool_true")]
    pub trust_server_certificate: bool,
}

/// SMTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(default = "default_from")]
    pub from: String,
}

fn default_db_port() -> u16 { 5432 }
fn default_smtp_port() -> u16 { 587 }
fn default_from() -> String { "SQLCourier <support@prettyneat.io>".into() }
fn bool_true() -> bool { true }

impl Credentials {
    /// Load credentials from a JSON file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CourierError::Credentials(format!("Failed to read {}: {e}", path.display()))
        })?;
        let creds: Self = serde_json::from_str(&content).map_err(|e| {
            CourierError::Credentials(format!("Failed to parse {}: {e}", path.display()))
        })?;
        Ok(creds)
    }
}

/// Hands out a fresh copy of the credentials on every call, so a config edit
/// takes effect on the next scheduled fire without a restart.
#[derive(Debug, Clone)]
pub struct CredentialProvider {
    path: PathBuf,
}

impl CredentialProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying credentials file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the credentials file.
    pub fn fetch(&self) -> Result<Credentials> {
        Credentials::load_from(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sqlcourier-cfg-{name}-{}", std::process::id()))
    }

    const FULL_JSON: &str = r#"{
        "db": {
            "username": "reporter",
            "password": "hunter2",
            "server": "db.internal",
            "port": 5433,
            "database": "sales",
            "trust_server_certificate": false
        },
        "email": {
            "host": "smtp.internal",
            "port": 2525,
            "username": "courier",
            "password": "sekrit",
            "from": "Reports <reports@internal>"
        }
    }"#;

    #[test]
    fn test_parse_full_credentials() {
        let creds: Credentials = serde_json::from_str(FULL_JSON).unwrap();
        assert_eq!(creds.db.server, "db.internal");
        assert_eq!(creds.db.port, 5433);
        assert!(!creds.db.trust_server_certificate);
        assert_eq!(creds.email.port, 2525);
        assert_eq!(creds.email.from, "Reports <reports@internal>");
    }

    #[test]
    fn test_optional_fields_use_defaults() {
        let json = r#"{
            "db": { "username": "u", "password": "p", "server": "s", "database": "d" },
            "email": { "host": "h", "username": "u", "password": "p" }
        }"#;
        let creds: Credentials = serde_json::from_str(json).unwrap();
        assert_eq!(creds.db.port, 5432);
        assert!(creds.db.trust_server_certificate);
        assert_eq!(creds.email.port, 587);
        assert_eq!(creds.email.from, "SQLCourier <support@prettyneat.io>");
    }

    #[test]
    fn test_missing_file_is_credentials_error() {
        let err = Credentials::load_from(Path::new("/nonexistent/credentials.json")).unwrap_err();
        assert!(matches!(err, CourierError::Credentials(_)));
    }

    #[test]
    fn test_provider_rereads_on_every_fetch() {
        let dir = test_dir("reread");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("credentials.json");
        std::fs::write(&path, FULL_JSON).unwrap();

        let provider = CredentialProvider::new(&path);
        assert_eq!(provider.fetch().unwrap().db.database, "sales");

        std::fs::write(&path, FULL_JSON.replace("sales", "finance")).unwrap();
        assert_eq!(provider.fetch().unwrap().db.database, "finance");

        std::fs::remove_dir_all(&dir).ok();
    }
}
