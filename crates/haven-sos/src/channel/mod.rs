//! Notification channels. Each sends one message to one recipient.
//!
//! | Channel | Transport | On transport failure |
//! |---------|-----------|----------------------|
//! | [`EmailChannel`] | [`MailTransport`] (SMTP in production) | logs, returns `false` |
//! | [`SmsChannel`] | [`SmsProvider`] (Twilio) or logging fallback | logs, returns `true` |

pub mod email;
pub mod sms;

use std::future::Future;

pub use email::{EmailChannel, MailTransport, OutboundEmail, SmtpMailer};
pub use sms::{SmsChannel, SmsProvider, TwilioSms};

/// Sends a single notification.
///
/// `true` means the message was handed to the transport. Implementations
/// never return an error: transport failures are logged and folded into the
/// boolean.
pub trait NotificationChannel: Send + Sync {
  fn send(
    &self,
    recipient: &str,
    subject: &str,
    body: &str,
  ) -> impl Future<Output = bool> + Send;
}
