use async_trait::async_trait;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::config::SmtpConfig;
use crate::mail::{EmailError, EmailMessage, SendEmail};

pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    /// Port 465 uses implicit TLS; every other port upgrades with STARTTLS.
    pub fn new(config: &SmtpConfig, sender_name: &str) -> Result<Self, EmailError> {
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| EmailError::RelayConnectionFailed(e.to_string()))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        let address: Address = config
            .from_email
            .parse()
            .map_err(|_| EmailError::InvalidAddress(config.from_email.clone()))?;

        Ok(Self {
            transport,
            from: Mailbox::new(Some(sender_name.to_string()), address),
        })
    }
}

fn build_message(from: Mailbox, message: EmailMessage) -> Result<Message, EmailError> {
    let to: Mailbox = message
        .to
        .parse()
        .map_err(|_| EmailError::InvalidAddress(message.to.clone()))?;

    let mut body = MultiPart::mixed().singlepart(SinglePart::html(message.html));
    for attachment in message.attachments {
        let content_type = ContentType::parse(attachment.content_type)
            .map_err(|e| EmailError::InvalidMessage(e.to_string()))?;
        body = body.singlepart(
            Attachment::new(attachment.filename).body(attachment.content, content_type),
        );
    }

    Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject)
        .multipart(body)
        .map_err(|e| EmailError::InvalidMessage(e.to_string()))
}

#[async_trait]
impl SendEmail for SmtpSender {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        let to = message.to.clone();
        let email = build_message(self.from.clone(), message)?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| EmailError::FailedToSend(e.to_string()))?;

        tracing::info!(to = %to, code = %response.code(), "Email sent");
        Ok(())
    }
}
