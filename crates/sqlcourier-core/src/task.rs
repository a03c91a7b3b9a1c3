//! Task definitions — the parsed form of a task file.

use serde_json::{Map, Value};
use std::path::PathBuf;

/// Directive prefix declaring the cron schedule.
pub const CRON_DIRECTIVE: &str = "-- CRON:";
/// Directive prefix declaring the report recipient.
pub const EMAIL_DIRECTIVE: &str = "-- EMAIL:";

/// One schedulable unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Originating file path; the registry key.
    pub source_id: PathBuf,
    /// 5-field cron expression (minute hour day month weekday).
    pub schedule: String,
    /// Report recipient. May be empty, which turns delivery into a no-op.
    pub recipient: String,
    /// Query text: every non-directive line, in order, newline-terminated.
    pub query: String,
    /// Bind parameters for a future parameterized-query path. Nothing sets
    /// this yet; executions run the query text verbatim.
    pub params: Option<Map<String, Value>>,
}

impl Task {
    /// Parse task-file text. Pure: identical text yields an identical task.
    ///
    /// Directive prefixes are matched case-sensitively at line start and the
    /// last occurrence wins. Every other line, blank lines included, joins
    /// the query body. Missing directives leave empty fields; validation
    /// happens at registration, not here.
    pub fn parse(source_id: impl Into<PathBuf>, text: &str) -> Self {
        let mut schedule = String::new();
        let mut recipient = String::new();
        let mut query = String::new();

        for line in text.split('\n') {
            if let Some(rest) = line.strip_prefix(CRON_DIRECTIVE) {
                schedule = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix(EMAIL_DIRECTIVE) {
                recipient = rest.trim().to_string();
            } else {
                query.push_str(line);
                query.push('\n');
            }
        }

        Self {
            source_id: source_id.into(),
            schedule,
            recipient,
            query,
            params: None,
        }
    }
}
