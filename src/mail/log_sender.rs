use async_trait::async_trait;

use crate::mail::{EmailError, EmailMessage, SendEmail};

#[derive(Default)]
pub struct LogSender {}

impl LogSender {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl SendEmail for LogSender {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "Email not delivered (no SMTP relay configured)"
        );
        Ok(())
    }
}
