//! # SQLCourier Core
//!
//! Shared building blocks for the SQLCourier workspace: the task model and
//! its directive parser, the credentials file, the central error type, and
//! the collaborator traits implemented by the db and mail crates.

pub mod config;
pub mod error;
pub mod task;
pub mod traits;

pub use config::{CredentialProvider, Credentials, DbConfig, SmtpConfig};
pub use error::{CourierError, Result};
pub use task::Task;
pub use traits::{Notifier, QueryBackend, ResultRow};
