//! Delivery notification over SMTP.
//!
//! Sends the customer their delivery-page link once credentials are issued.
//! Uses lettre's async SMTP transport with STARTTLS. A notification failure
//! is logged by the caller and never revokes already-issued credentials; the
//! delivery page itself is the recovery path.

use async_trait::async_trait;
use dropwire_core::Email;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::SmtpConfig;

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build the email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid sender or recipient address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

/// Delivers a rendered message to a customer address.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `subject` with the given plain-text and HTML bodies to
    /// `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the message cannot be built or the
    /// transport fails.
    async fn notify(
        &self,
        recipient: &Email,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), NotifyError>;
}

/// SMTP-backed notifier.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotifier {
    /// Create a notifier from SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay configuration is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(
        &self,
        recipient: &Email,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotifyError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(recipient
                .as_str()
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(recipient.as_str().to_owned()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_owned()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_owned()),
                    ),
            )?;

        self.mailer.send(message).await?;

        tracing::info!(to = %recipient, subject = %subject, "Delivery email sent");
        Ok(())
    }
}
