use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use crate::config::MailConfig;

pub const VERIFICATION_SUBJECT: &str = "Verification code - RivalTeamFinder";

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("invalid message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp relay: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Sends the registration verification code to its owner.
#[async_trait]
pub trait VerificationNotifier: Send + Sync {
    async fn send_verification_email(&self, to: &str, code: &str) -> Result<(), DeliveryError>;
}

/// Transport seam; the SMTP relay in production.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), DeliveryError>;
}

#[async_trait]
impl Mailer for AsyncSmtpTransport<Tokio1Executor> {
    async fn send(&self, message: Message) -> Result<(), DeliveryError> {
        AsyncTransport::send(self, message).await?;
        Ok(())
    }
}

pub struct SmtpNotifier {
    mailer: Box<dyn Mailer>,
    from: String,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)?
                .port(config.port)
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server)
                .port(config.port)
                .credentials(creds)
                .build()
        };
        // Reject a malformed sender at startup rather than on the first registration.
        config.sender.parse::<Mailbox>()?;
        Ok(Self::new_with_mailer(Box::new(transport), &config.sender))
    }

    pub fn new_with_mailer(mailer: Box<dyn Mailer>, from: &str) -> Self {
        Self {
            mailer,
            from: from.to_string(),
        }
    }

    fn build(&self, to: &str, code: &str) -> Result<Message, DeliveryError> {
        let message = Message::builder()
            .from(self.from.parse::<Mailbox>()?)
            .to(to.parse::<Mailbox>()?)
            .subject(VERIFICATION_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(format!("Your verification code is: {}", code))?;
        Ok(message)
    }
}

#[async_trait]
impl VerificationNotifier for SmtpNotifier {
    async fn send_verification_email(&self, to: &str, code: &str) -> Result<(), DeliveryError> {
        let message = self.build(to, code)?;
        self.mailer.send(message).await?;
        debug!(to = %to, "verification email sent");
        Ok(())
    }
}
