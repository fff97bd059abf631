//! SMS channel: a real provider when credentials are configured, otherwise a
//! logging fallback. The choice is made once, at construction.

use std::{future::Future, time::Duration};

use secrecy::{ExposeSecret as _, SecretString};

use super::NotificationChannel;
use crate::{config::SmsConfig, error::TransportError};

/// Something that can deliver a text message.
pub trait SmsProvider: Send + Sync {
  fn send_sms(
    &self,
    to: &str,
    body: &str,
  ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

// ─── Twilio ──────────────────────────────────────────────────────────────────

/// [`SmsProvider`] backed by the Twilio Messages REST API.
///
/// The auth token is held as a [`SecretString`] and only exposed when
/// building the request.
pub struct TwilioSms {
  client:      reqwest::Client,
  account_sid: String,
  auth_token:  SecretString,
  from_number: String,
  api_base:    String,
}

impl TwilioSms {
  pub fn new(
    account_sid: String,
    auth_token: SecretString,
    from_number: String,
    timeout: Duration,
  ) -> Result<Self, TransportError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      account_sid,
      auth_token,
      from_number,
      api_base: "https://api.twilio.com".to_string(),
    })
  }

  /// Override the API base URL (useful for testing or proxies).
  pub fn with_api_base(mut self, api_base: String) -> Self {
    self.api_base = api_base.trim_end_matches('/').to_string();
    self
  }

  fn messages_url(&self) -> String {
    format!(
      "{}/2010-04-01/Accounts/{}/Messages.json",
      self.api_base, self.account_sid
    )
  }
}

impl SmsProvider for TwilioSms {
  async fn send_sms(&self, to: &str, body: &str) -> Result<(), TransportError> {
    let response = self
      .client
      .post(self.messages_url())
      .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
      .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", body)])
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let detail = response.text().await.unwrap_or_default();
      return Err(TransportError::Rejected(format!("{status}: {detail}")));
    }
    Ok(())
  }
}

// ─── Channel ─────────────────────────────────────────────────────────────────

/// SMS [`NotificationChannel`].
///
/// SMS confirmation is not part of an alert's success: with no provider, or
/// when the provider fails, the message is logged and `send` still reports
/// `true`.
pub enum SmsChannel<P> {
  Provider { provider: P, timeout: Duration },
  LoggingFallback,
}

impl<P: SmsProvider> SmsChannel<P> {
  pub fn provider(provider: P, timeout: Duration) -> Self {
    Self::Provider { provider, timeout }
  }

  pub fn is_fallback(&self) -> bool { matches!(self, Self::LoggingFallback) }
}

impl SmsChannel<TwilioSms> {
  /// Select Twilio when every credential is present, the logging fallback
  /// otherwise.
  pub fn from_config(cfg: Option<&SmsConfig>) -> Self {
    let Some((cfg, (sid, token, from))) =
      cfg.and_then(|c| c.credentials().map(|creds| (c, creds)))
    else {
      tracing::info!("no SMS provider configured; SMS will be logged only");
      return Self::LoggingFallback;
    };

    let timeout = Duration::from_secs(cfg.timeout_secs);
    let token   = SecretString::from(token.expose_secret().to_owned());
    match TwilioSms::new(sid.to_owned(), token, from.to_owned(), timeout) {
      Ok(twilio) => Self::provider(twilio.with_api_base(cfg.api_base.clone()), timeout),
      Err(e) => {
        tracing::error!(error = %e, "could not build SMS client; SMS will be logged only");
        Self::LoggingFallback
      }
    }
  }
}

fn log_fallback(recipient: &str, body: &str) {
  tracing::info!(recipient, body, "[SMS fallback] message not sent through a provider");
}

impl<P: SmsProvider> NotificationChannel for SmsChannel<P> {
  async fn send(&self, recipient: &str, _subject: &str, body: &str) -> bool {
    let (provider, timeout) = match self {
      Self::Provider { provider, timeout } => (provider, *timeout),
      Self::LoggingFallback => {
        log_fallback(recipient, body);
        return true;
      }
    };

    let result = tokio::time::timeout(timeout, provider.send_sms(recipient, body))
      .await
      .unwrap_or_else(|_| Err(TransportError::Timeout(timeout)));

    match result {
      Ok(()) => tracing::info!(recipient, "SOS SMS sent"),
      Err(e) => {
        tracing::warn!(recipient, error = %e, "SMS provider failed");
        log_fallback(recipient, body);
      }
    }
    true
  }
}
