use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, instrument};

use crate::core::config::MailConfig;
use crate::core::notify::{MailTransport, NotificationMessage, SendError};

/// Submits notifications over SMTP with implicit TLS to a relay such as Gmail.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(relay: &str, mail: &MailConfig) -> Result<Self, SendError> {
        let credentials = Credentials::new(mail.user.clone(), mail.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(relay)
            .map_err(|e| SendError::Transport(format!("Invalid relay {relay}: {e}")))?
            .credentials(credentials)
            .build();
        Ok(Self { transport })
    }
}

fn parse_address(address: &str) -> Result<Address, SendError> {
    address
        .trim()
        .parse::<Address>()
        .map_err(|e| SendError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

pub fn build_message(message: &NotificationMessage) -> Result<Message, SendError> {
    let from = Mailbox::new(
        Some(message.sender_name.clone()),
        parse_address(&message.sender_address)?,
    );
    let to = Mailbox::new(None, parse_address(&message.recipient)?);

    Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .map_err(|e| SendError::Message(e.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailer {
    #[instrument(name = "SmtpSubmit", skip(self, message), fields(to = %message.recipient))]
    async fn submit(&self, message: &NotificationMessage) -> Result<String, SendError> {
        let email = build_message(message)?;
        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let text: Vec<&str> = response.message().collect();
        debug!(code = %response.code(), "SMTP server accepted message");
        Ok(format!("{} {}", response.code(), text.join(" ")))
    }
}
