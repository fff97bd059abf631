//! Email channel and its SMTP transport.

use std::{future::Future, time::Duration};

use lettre::{
  AsyncSmtpTransport, AsyncTransport as _, Message, Tokio1Executor,
  message::{Mailbox, header::ContentType},
  transport::smtp::authentication::Credentials,
};
use secrecy::ExposeSecret as _;

use super::NotificationChannel;
use crate::{config::EmailConfig, error::TransportError};

/// A plain-text email ready for a [`MailTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
  pub to:      String,
  pub subject: String,
  pub body:    String,
}

/// Something that can put an email on the wire.
pub trait MailTransport: Send + Sync {
  fn deliver(
    &self,
    email: &OutboundEmail,
  ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

// ─── SMTP ────────────────────────────────────────────────────────────────────

/// [`MailTransport`] over SMTP using the configured relay.
pub struct SmtpMailer {
  transport: AsyncSmtpTransport<Tokio1Executor>,
  from:      Mailbox,
}

impl SmtpMailer {
  /// Build a mailer from configuration. No connection is made until the
  /// first delivery.
  pub fn from_config(cfg: &EmailConfig) -> Result<Self, TransportError> {
    if cfg.use_tls && cfg.use_ssl {
      return Err(TransportError::Config(
        "use_tls and use_ssl are mutually exclusive".to_string(),
      ));
    }

    let builder = if cfg.use_ssl {
      AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)?
    } else if cfg.use_tls {
      AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)?
    } else {
      AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.host)
    };

    let mut builder = builder
      .port(cfg.port)
      .timeout(Some(Duration::from_secs(cfg.timeout_secs)));

    if let (Some(user), Some(pass)) = (&cfg.username, &cfg.password) {
      builder = builder.credentials(Credentials::new(
        user.clone(),
        pass.expose_secret().to_owned(),
      ));
    }

    let from = cfg
      .from_address
      .as_deref()
      .or(cfg.username.as_deref())
      .ok_or_else(|| {
        TransportError::Config("no from_address or username configured".to_string())
      })?
      .parse::<Mailbox>()?;

    Ok(Self { transport: builder.build(), from })
  }
}

impl MailTransport for SmtpMailer {
  async fn deliver(&self, email: &OutboundEmail) -> Result<(), TransportError> {
    let message = Message::builder()
      .from(self.from.clone())
      .to(email.to.parse::<Mailbox>()?)
      .subject(email.subject.clone())
      .header(ContentType::TEXT_PLAIN)
      .body(email.body.clone())?;

    self.transport.send(message).await?;
    Ok(())
  }
}

// ─── Channel ─────────────────────────────────────────────────────────────────

/// Email [`NotificationChannel`]. Any transport error, including a timeout,
/// is logged and reported as `false`.
pub struct EmailChannel<M> {
  transport: M,
  timeout:   Duration,
}

impl<M: MailTransport> EmailChannel<M> {
  pub fn new(transport: M, timeout: Duration) -> Self {
    Self { transport, timeout }
  }
}

impl<M: MailTransport> NotificationChannel for EmailChannel<M> {
  async fn send(&self, recipient: &str, subject: &str, body: &str) -> bool {
    let email = OutboundEmail {
      to:      recipient.to_owned(),
      subject: subject.to_owned(),
      body:    body.to_owned(),
    };

    let result = tokio::time::timeout(self.timeout, self.transport.deliver(&email))
      .await
      .unwrap_or_else(|_| Err(TransportError::Timeout(self.timeout)));

    match result {
      Ok(()) => {
        tracing::info!(recipient, "SOS email sent");
        true
      }
      Err(e) => {
        tracing::error!(recipient, error = %e, "failed to send SOS email");
        false
      }
    }
  }
}
