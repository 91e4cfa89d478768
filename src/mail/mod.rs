pub mod log_sender;
pub mod smtp;
pub mod templates;

use async_trait::async_trait;
use derive_more::Display;

use crate::config::Config;

#[derive(Debug, Display)]
pub enum EmailError {
    #[display(fmt = "EmailError: Relay connection failed: {}", _0)]
    RelayConnectionFailed(String),
    #[display(fmt = "EmailError: Invalid address: {}", _0)]
    InvalidAddress(String),
    #[display(fmt = "EmailError: Invalid message: {}", _0)]
    InvalidMessage(String),
    #[display(fmt = "EmailError: Failed to send: {}", _0)]
    FailedToSend(String),
}

impl std::error::Error for EmailError {}

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: &'static str,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<EmailAttachment>,
}

#[async_trait]
pub trait SendEmail: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

pub type EmailSender = Box<dyn SendEmail>;

/// SMTP when configured, otherwise a sender that only logs.
pub fn sender_from_config(config: &Config) -> Result<EmailSender, EmailError> {
    match &config.smtp {
        Some(smtp) => Ok(Box::new(smtp::SmtpSender::new(smtp, &config.company_name)?)),
        None => {
            tracing::warn!("SMTP is not configured; outgoing mail will only be logged");
            Ok(Box::new(log_sender::LogSender::new()))
        }
    }
}
