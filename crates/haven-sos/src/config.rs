//! Notification settings, deserialised from the server configuration.
//!
//! Channels receive these explicitly at construction; nothing in this crate
//! reads the process environment.

use secrecy::SecretString;
use serde::Deserialize;

fn default_smtp_port() -> u16 { 465 }

fn default_true() -> bool { true }

fn default_timeout_secs() -> u64 { 10 }

fn default_twilio_api_base() -> String { "https://api.twilio.com".to_string() }

fn default_app_name() -> String { "Haven".to_string() }

fn default_max_concurrency() -> usize { 4 }

/// Outbound SMTP settings.
#[derive(Debug, Deserialize)]
pub struct EmailConfig {
  pub host:         String,
  #[serde(default = "default_smtp_port")]
  pub port:         u16,
  pub username:     Option<String>,
  pub password:     Option<SecretString>,
  /// Upgrade a plaintext connection with STARTTLS.
  #[serde(default)]
  pub use_tls:      bool,
  /// Connect over implicit TLS (SMTPS). Mutually exclusive with `use_tls`.
  #[serde(default = "default_true")]
  pub use_ssl:      bool,
  /// Sender address; defaults to `username` when unset.
  pub from_address: Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

/// Twilio credentials. Every credential must be present (and non-empty) for
/// the real provider to be used.
#[derive(Debug, Default, Deserialize)]
pub struct SmsConfig {
  pub account_sid:  Option<String>,
  pub auth_token:   Option<SecretString>,
  pub from_number:  Option<String>,
  #[serde(default = "default_twilio_api_base")]
  pub api_base:     String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl SmsConfig {
  /// `(account_sid, auth_token, from_number)` when all three are set.
  pub fn credentials(&self) -> Option<(&str, &SecretString, &str)> {
    let sid   = self.account_sid.as_deref().filter(|s| !s.is_empty())?;
    let token = self.auth_token.as_ref()?;
    let from  = self.from_number.as_deref().filter(|s| !s.is_empty())?;
    Some((sid, token, from))
  }
}

/// Settings for the fanout itself.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
  /// Application name shown in the email subject.
  #[serde(default = "default_app_name")]
  pub app_name:        String,
  /// Upper bound on contacts notified in parallel.
  #[serde(default = "default_max_concurrency")]
  pub max_concurrency: usize,
}

impl Default for NotifyConfig {
  fn default() -> Self {
    Self {
      app_name:        default_app_name(),
      max_concurrency: default_max_concurrency(),
    }
  }
}
