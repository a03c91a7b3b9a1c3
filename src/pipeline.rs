//! Execution pipeline: credentials, query, report, delivery.

use std::sync::Arc;

use async_trait::async_trait;
use sqlcourier_core::{CredentialProvider, Notifier, QueryBackend, Result, ResultRow, Task};
use sqlcourier_scheduler::JobRunner;
use tracing::{debug, info, warn};

/// Subject line for every report email.
pub const REPORT_SUBJECT: &str = "SQL Query Results";

/// Per-fire execution. Credentials are resolved fresh each run, the query
/// goes through the database client, and the rendered rows go out by mail.
/// Query failures propagate to the fire boundary; delivery failures are
/// logged here and swallowed, so a broken mailbox never reads as a broken
/// query.
pub struct ExecutionPipeline {
    credentials: CredentialProvider,
    db: Arc<dyn QueryBackend>,
    mailer: Arc<dyn Notifier>,
}

impl ExecutionPipeline {
    pub fn new(
        credentials: CredentialProvider,
        db: Arc<dyn QueryBackend>,
        mailer: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            credentials,
            db,
            mailer,
        }
    }
}

#[async_trait]
impl JobRunner for ExecutionPipeline {
    async fn run(&self, task: &Task) -> Result<usize> {
        let creds = self.credentials.fetch()?;

        debug!(
            "🔎 Executing query for {}: {}",
            task.source_id.display(),
            task.query.trim()
        );
        let rows = self.db.run_query(&creds.db, &task.query).await?;
        info!(
            "📝 {} returned {} row(s)",
            task.source_id.display(),
            rows.len()
        );

        if task.recipient.is_empty() {
            warn!(
                "📭 No recipient declared in {}, skipping delivery",
                task.source_id.display()
            );
            return Ok(rows.len());
        }

        let body = render_report(&rows);
        if let Err(e) = self
            .mailer
            .deliver(&creds.email, &task.recipient, REPORT_SUBJECT, &body)
            .await
        {
            warn!("⚠️ Delivery to {} failed: {e}", task.recipient);
        }
        Ok(rows.len())
    }
}

/// Render rows as the report body. An empty result set still renders, as
/// an empty JSON array; it is not suppressed.
fn render_report(rows: &[ResultRow]) -> String {
    let rendered = serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".into());
    format!("Here are the results of your SQL query:\n{rendered}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlcourier_core::{CourierError, DbConfig, SmtpConfig};
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct StubBackend {
        calls: Mutex<usize>,
        rows: Vec<ResultRow>,
        fail: bool,
    }

    impl StubBackend {
        fn returning(rows: Vec<ResultRow>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(0),
                rows,
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(0),
                rows: vec![],
                fail: true,
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl QueryBackend for StubBackend {
        async fn run_query(&self, _config: &DbConfig, _sql: &str) -> Result<Vec<ResultRow>> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                Err(CourierError::Database("simulated query failure".into()))
            } else {
                Ok(self.rows.clone())
            }
        }
    }

    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
        fail: bool,
    }

    impl RecordingMailer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(vec![]),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(vec![]),
                fail: true,
            })
        }

        fn sent(&self) -> Vec<(String, String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingMailer {
        async fn deliver(
            &self,
            _config: &SmtpConfig,
            recipient: &str,
            subject: &str,
            body: &str,
        ) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient.into(), subject.into(), body.into()));
            if self.fail {
                Err(CourierError::Delivery("simulated delivery failure".into()))
            } else {
                Ok(())
            }
        }
    }

    const CREDS: &str = r#"{
        "db": { "username": "u", "password": "p", "server": "s", "database": "d" },
        "email": { "host": "h", "username": "u", "password": "p" }
    }"#;

    fn credentials_file(name: &str) -> (PathBuf, CredentialProvider) {
        let dir = std::env::temp_dir().join(format!(
            "sqlcourier-pipe-{name}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("credentials.json");
        std::fs::write(&path, CREDS).unwrap();
        (dir, CredentialProvider::new(path))
    }

    fn task(recipient_line: &str) -> Task {
        let text = format!("-- CRON: * * * * *\n{recipient_line}SELECT 1 AS x");
        Task::parse("report.sql", &text)
    }

    fn one_row() -> ResultRow {
        let mut row = ResultRow::new();
        row.insert("x".into(), serde_json::json!(1));
        row
    }

    #[tokio::test]
    async fn test_empty_result_set_is_still_delivered() {
        let (dir, provider) = credentials_file("empty");
        let mailer = RecordingMailer::new();
        let pipeline =
            ExecutionPipeline::new(provider, StubBackend::returning(vec![]), mailer.clone());

        let handled = pipeline.run(&task("-- EMAIL: ops@example.com\n")).await.unwrap();
        assert_eq!(handled, 0);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        let (to, subject, body) = &sent[0];
        assert_eq!(to, "ops@example.com");
        assert_eq!(subject, REPORT_SUBJECT);
        assert_eq!(body, "Here are the results of your SQL query:\n[]");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_rows_render_into_the_report_body() {
        let (dir, provider) = credentials_file("rows");
        let mailer = RecordingMailer::new();
        let pipeline = ExecutionPipeline::new(
            provider,
            StubBackend::returning(vec![one_row()]),
            mailer.clone(),
        );

        let handled = pipeline.run(&task("-- EMAIL: ops@example.com\n")).await.unwrap();
        assert_eq!(handled, 1);

        let body = &mailer.sent()[0].2;
        assert!(body.starts_with("Here are the results of your SQL query:\n"));
        assert!(body.contains("\"x\": 1"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_query_failure_propagates_and_skips_delivery() {
        let (dir, provider) = credentials_file("qfail");
        let mailer = RecordingMailer::new();
        let pipeline = ExecutionPipeline::new(provider, StubBackend::failing(), mailer.clone());

        let err = pipeline
            .run(&task("-- EMAIL: ops@example.com\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Database(_)));
        assert!(mailer.sent().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_the_query() {
        let provider = CredentialProvider::new("/nonexistent/credentials.json");
        let backend = StubBackend::returning(vec![]);
        let mailer = RecordingMailer::new();
        let pipeline = ExecutionPipeline::new(provider, backend.clone(), mailer.clone());

        let err = pipeline
            .run(&task("-- EMAIL: ops@example.com\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Credentials(_)));
        assert_eq!(backend.calls(), 0);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_empty_recipient_skips_delivery_but_succeeds() {
        let (dir, provider) = credentials_file("norcpt");
        let mailer = RecordingMailer::new();
        let pipeline = ExecutionPipeline::new(
            provider,
            StubBackend::returning(vec![one_row()]),
            mailer.clone(),
        );

        let handled = pipeline.run(&task("")).await.unwrap();
        assert_eq!(handled, 1);
        assert!(mailer.sent().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let (dir, provider) = credentials_file("dfail");
        let mailer = RecordingMailer::failing();
        let pipeline = ExecutionPipeline::new(
            provider,
            StubBackend::returning(vec![one_row()]),
            mailer.clone(),
        );

        let handled = pipeline.run(&task("-- EMAIL: ops@example.com\n")).await.unwrap();
        assert_eq!(handled, 1);
        assert_eq!(mailer.sent().len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
