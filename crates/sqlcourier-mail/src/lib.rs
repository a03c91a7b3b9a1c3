//! # SQLCourier Mail
//!
//! SMTP delivery via async lettre. The transport is rebuilt from the
//! freshly loaded credentials on every delivery, so config edits apply to
//! the very next report.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use sqlcourier_core::{CourierError, Notifier, Result, SmtpConfig};

/// SMTP notification sender.
#[derive(Debug, Default, Clone)]
pub struct Mailer;

impl Mailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for Mailer {
    async fn deliver(
        &self,
        config: &SmtpConfig,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<()> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| CourierError::Delivery(format!("Invalid from address: {e}")))?;
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| CourierError::Delivery(format!("Invalid recipient '{recipient}': {e}")))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| CourierError::Delivery(format!("Build email: {e}")))?;

        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| CourierError::Delivery(format!("SMTP relay: {e}")))?
            .port(config.port)
            .credentials(creds)
            .build();

        transport
            .send(email)
            .await
            .map_err(|e| CourierError::Delivery(format!("SMTP send: {e}")))?;

        tracing::info!("📤 Report sent to: {recipient}");
        Ok(())
    }
}
