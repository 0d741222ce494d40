//! Outbound notification email.
//!
//! Delivery sits behind the [`Mailer`] trait. The default [`LogMailer`]
//! appends to the persistent email log and emits a log line, which is the
//! simulated delivery the product has always run with. [`WebhookMailer`]
//! instead posts each message to an HTTP endpoint configured through the
//! environment; when no endpoint is configured it reports itself disabled.

use std::env;
use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;
use url::Url;

use patente_core::Clock;
use patente_core::model::{EmailKind, EmailStatus, UserId};
use storage::repository::{EmailLogRecord, EmailLogRepository};

use crate::error::MailerError;

/// One notification on its way out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub user_id: Option<UserId>,
    pub kind: EmailKind,
    /// Recipient's first name, for the salutation.
    pub recipient_name: String,
}

impl OutgoingEmail {
    /// Subject line for this notification kind.
    #[must_use]
    pub fn subject(&self) -> &'static str {
        match self.kind {
            EmailKind::Registration => "مرحباً بك في Patente Hub 🚗",
            EmailKind::PasswordChange => "تم تغيير كلمة المرور 🔒",
            EmailKind::EmailChange => "تم تغيير البريد الإلكتروني 📧",
            EmailKind::PasswordReset => "إعادة تعيين كلمة المرور 🔑",
        }
    }
}

/// Delivery backend for notification email.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers one message.
    ///
    /// # Errors
    ///
    /// Returns [`MailerError`] when delivery fails. Senders treat this as
    /// non-fatal.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError>;
}

/// Simulated delivery: record the send in the email log and log it.
pub struct LogMailer {
    clock: Clock,
    email_logs: Arc<dyn EmailLogRepository>,
}

impl LogMailer {
    #[must_use]
    pub fn new(clock: Clock, email_logs: Arc<dyn EmailLogRepository>) -> Self {
        Self { clock, email_logs }
    }
}

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        let record = EmailLogRecord {
            id: None,
            user_id: email.user_id,
            email: email.to.clone(),
            kind: email.kind,
            sent_at: self.clock.now(),
            status: EmailStatus::Sent,
        };
        self.email_logs.append_email_log(&record).await?;
        tracing::info!(
            to = %email.to,
            kind = email.kind.as_str(),
            subject = email.subject(),
            "email sent"
        );
        Ok(())
    }
}

/// Webhook delivery settings, read from the environment.
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub endpoint: Url,
    pub api_key: Option<String>,
}

impl WebhookConfig {
    /// Reads `PATENTE_MAIL_WEBHOOK_URL` and `PATENTE_MAIL_API_KEY`.
    ///
    /// Returns `None` when the URL is unset, empty, or not a valid URL.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let raw = env::var("PATENTE_MAIL_WEBHOOK_URL").ok()?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let endpoint = Url::parse(raw).ok()?;
        let api_key = env::var("PATENTE_MAIL_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        Some(Self { endpoint, api_key })
    }
}

/// Posts each message as JSON to a configured endpoint.
pub struct WebhookMailer {
    client: Client,
    config: Option<WebhookConfig>,
}

impl WebhookMailer {
    #[must_use]
    pub fn new(config: Option<WebhookConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(WebhookConfig::from_env())
    }

    /// Whether an endpoint is configured.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait::async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        let config = self.config.as_ref().ok_or(MailerError::Disabled)?;
        let payload = WebhookPayload {
            to: &email.to,
            subject: email.subject(),
            kind: email.kind.as_str(),
            name: &email.recipient_name,
        };
        let mut request = self.client.post(config.endpoint.clone()).json(&payload);
        if let Some(key) = &config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(MailerError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    to: &'a str,
    subject: &'a str,
    kind: &'a str,
    name: &'a str,
}
