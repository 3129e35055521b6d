//! Outbound mail. Only password-reset tokens are ever sent.

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use crate::config::MailerConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mailbox {address:?}: {message}")]
    Address { address: String, message: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("smtp transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutboundEmail {
    #[must_use]
    pub fn password_reset(to: &str, token: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Reset Password".to_string(),
            body: format!(
                "Your reset token {token:?}. Please make a request to PUT /v1/users/password with this token"
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

/// Pick the transport the configuration asks for.
pub fn from_config(config: &MailerConfig) -> Result<Arc<dyn Mailer>, MailError> {
    if config.enabled {
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        Ok(Arc::new(LogMailer))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        message: e.to_string(),
    })
}

/// STARTTLS relay with optional credentials.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Must be called inside a tokio runtime; the connection pool spawns a
    /// reaper task.
    pub fn new(config: &MailerConfig) -> Result<Self, MailError> {
        let from = parse_mailbox(&config.email_from)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Writes messages to the log instead of delivering them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "Mail delivery disabled, logging message"
        );
        Ok(())
    }
}

/// Keeps every message in memory, for tests and local tooling.
#[derive(Default, Clone)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl MemoryMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(email);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_email_carries_token() {
        let email = OutboundEmail::password_reset("alice@example.com", "ABCDEF");
        assert_eq!(email.subject, "Reset Password");
        assert!(email.body.contains("\"ABCDEF\""));
        assert_eq!(email.to, "alice@example.com");
    }

    #[test]
    fn disabled_config_logs_instead() {
        let config = MailerConfig::default();
        assert!(from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn bad_sender_is_rejected() {
        let config = MailerConfig {
            enabled: true,
            host: "smtp.example.com".to_string(),
            email_from: "not a mailbox".to_string(),
            ..MailerConfig::default()
        };
        assert!(matches!(
            SmtpMailer::new(&config),
            Err(MailError::Address { .. })
        ));
    }

    #[tokio::test]
    async fn memory_mailer_records() {
        let mailer = MemoryMailer::new();
        mailer
            .send(OutboundEmail::password_reset("a@example.com", "T"))
            .await
            .unwrap();
        assert_eq!(mailer.sent().len(), 1);
    }
}
