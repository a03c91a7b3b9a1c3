//! Collaborator seams implemented by the db and mail crates.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::{DbConfig, SmtpConfig};
use crate::error::Result;

/// One result row: column name to value, in SELECT order.
pub type ResultRow = Map<String, Value>;

/// Runs a query and returns its rows.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Connect with `config`, run `sql`, release the connection on every
    /// exit path, and return the rows.
    async fn run_query(&self, config: &DbConfig, sql: &str) -> Result<Vec<ResultRow>>;
}

/// Delivers a rendered report to a recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(
        &self,
        config: &SmtpConfig,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<()>;
}
