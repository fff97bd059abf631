//! Server wiring for Haven: configuration loading and construction of the
//! production dispatcher.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use haven_sos::{
  ContactFanout, SosDispatcher,
  channel::{EmailChannel, SmsChannel, SmtpMailer, TwilioSms},
  config::{EmailConfig, NotifyConfig, SmsConfig},
  error::TransportError,
};
use haven_store_sqlite::SqliteStore;
use serde::Deserialize;

/// Environment variable prefix; nested keys use `__`
/// (e.g. `HAVEN_SMS__ACCOUNT_SID`).
pub const ENV_PREFIX: &str = "HAVEN";

pub type Fanout = ContactFanout<EmailChannel<SmtpMailer>, SmsChannel<TwilioSms>>;
pub type Dispatcher = SosDispatcher<SqliteStore, Fanout>;

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/haven/haven.db") }

/// Runtime configuration, deserialised from `haven.toml` and the environment.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Required to serve; the admin commands run without it.
  pub email:      Option<EmailConfig>,
  pub sms:        Option<SmsConfig>,
  #[serde(default)]
  pub notify:     NotifyConfig,
}

impl ServerConfig {
  /// Load from an optional TOML file, overridden by `HAVEN_*` variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::load_with(path, environment())
  }

  fn load_with(path: &Path, env: config::Environment) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(env)
      .build()?
      .try_deserialize()
  }

  /// `host:port`, ready for binding.
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// The store path with a leading `~/` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// `HAVEN_PORT` sets `port`; `HAVEN_SMS__ACCOUNT_SID` sets `sms.account_sid`.
fn environment() -> config::Environment {
  config::Environment::with_prefix(ENV_PREFIX)
    .prefix_separator("_")
    .separator("__")
}

/// Trim an optional CLI value, treating a blank one as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

/// Build the production fanout: SMTP email plus Twilio SMS (or the logging
/// fallback when SMS credentials are incomplete).
pub fn build_fanout(cfg: &ServerConfig, email: &EmailConfig) -> Result<Fanout, TransportError> {
  let mailer = SmtpMailer::from_config(email)?;
  let email = EmailChannel::new(mailer, Duration::from_secs(email.timeout_secs));
  let sms = SmsChannel::from_config(cfg.sms.as_ref());
  Ok(ContactFanout::new(email, sms, cfg.notify.clone()))
}

pub fn build_dispatcher(store: Arc<SqliteStore>, fanout: Fanout) -> Dispatcher {
  SosDispatcher::new(store, fanout)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use secrecy::ExposeSecret as _;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.address(), "127.0.0.1:8000");
    assert!(cfg.email.is_none());
    assert!(cfg.sms.is_none());
    assert_eq!(cfg.notify.app_name, "Haven");
    assert_eq!(cfg.notify.max_concurrency, 4);
  }

  #[test]
  fn full_config_deserialises_every_section() {
    let cfg = parse(
      r#"
      host = "0.0.0.0"
      port = 9000
      store_path = "/var/lib/haven.db"

      [email]
      host = "smtp.example.com"
      username = "alerts@example.com"
      password = "hunter2"

      [sms]
      account_sid = "AC123"
      auth_token = "token"
      from_number = "+15550000"

      [notify]
      app_name = "SafeChat"
      max_concurrency = 8
      "#,
    );

    assert_eq!(cfg.address(), "0.0.0.0:9000");
    assert_eq!(cfg.resolved_store_path(), PathBuf::from("/var/lib/haven.db"));

    let email = cfg.email.as_ref().unwrap();
    assert_eq!(email.port, 465);
    assert!(email.use_ssl);
    assert!(!email.use_tls);
    assert_eq!(email.password.as_ref().unwrap().expose_secret(), "hunter2");

    let sms = cfg.sms.as_ref().unwrap();
    assert!(sms.credentials().is_some());
    assert_eq!(sms.api_base, "https://api.twilio.com");

    assert_eq!(cfg.notify.app_name, "SafeChat");
    assert_eq!(cfg.notify.max_concurrency, 8);
  }

  #[test]
  fn partial_sms_section_selects_fallback() {
    let cfg = parse(
      r#"
      [sms]
      account_sid = "AC123"
      "#,
    );
    assert!(SmsChannel::from_config(cfg.sms.as_ref()).is_fallback());
  }

  fn load_with_env(vars: &[(&str, &str)]) -> ServerConfig {
    let vars: config::Map<String, String> = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    ServerConfig::load_with(
      Path::new("/nonexistent/haven.toml"),
      environment().source(Some(vars)),
    )
    .unwrap()
  }

  #[test]
  fn env_overrides_top_level_and_nested_keys() {
    let cfg = load_with_env(&[
      ("HAVEN_PORT", "9123"),
      ("HAVEN_SMS__ACCOUNT_SID", "AC123"),
      ("HAVEN_SMS__AUTH_TOKEN", "token"),
      ("HAVEN_SMS__FROM_NUMBER", "+15550000"),
      ("HAVEN_NOTIFY__APP_NAME", "SafeChat"),
    ]);

    assert_eq!(cfg.port, 9123);
    assert_eq!(cfg.notify.app_name, "SafeChat");

    let sms = cfg.sms.as_ref().unwrap();
    let (sid, token, from) = sms.credentials().unwrap();
    assert_eq!(sid, "AC123");
    assert_eq!(token.expose_secret(), "token");
    assert_eq!(from, "+15550000");
    assert!(!SmsChannel::from_config(cfg.sms.as_ref()).is_fallback());
  }

  #[test]
  fn unprefixed_env_is_ignored() {
    let cfg = load_with_env(&[("PORT", "9123"), ("OTHER_PORT", "9124")]);
    assert_eq!(cfg.port, 8000);
  }

  #[test]
  fn non_blank_drops_empty_values() {
    assert_eq!(non_blank(None), None);
    assert_eq!(non_blank(Some(String::new())), None);
    assert_eq!(non_blank(Some("   ".into())), None);
    assert_eq!(non_blank(Some(" mum@example.com ".into())), Some("mum@example.com".into()));
  }

  #[test]
  fn expand_tilde_leaves_absolute_paths_alone() {
    let path = Path::new("/tmp/haven.db");
    assert_eq!(expand_tilde(path), path);
  }

  #[tokio::test]
  async fn fanout_builds_from_plain_smtp_config() {
    let cfg = parse(
      r#"
      [email]
      host = "localhost"
      port = 2525
      use_ssl = false
      from_address = "haven@localhost"
      "#,
    );
    let email = cfg.email.as_ref().unwrap();
    assert!(build_fanout(&cfg, email).is_ok());
  }
}
