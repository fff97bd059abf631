//! Notification text for an SOS trigger.

use chrono::{DateTime, Utc};
use haven_core::location::Coordinates;

const DEFAULT_EMAIL_MESSAGE: &str = "No additional message provided.";
const DEFAULT_SMS_MESSAGE: &str = "Alert";
const NO_LOCATION: &str = "Location not provided";

/// The email and SMS renderings of one SOS trigger, shared by every contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SosMessage {
  pub subject:  String,
  pub body:     String,
  pub sms_body: String,
}

/// Render the notification for `username`'s trigger at `at`.
///
/// A blank `message` is treated like a missing one.
pub fn compose(
  app_name: &str,
  username: &str,
  at: DateTime<Utc>,
  coordinates: Option<Coordinates>,
  message: Option<&str>,
) -> SosMessage {
  let message = message.map(str::trim).filter(|m| !m.is_empty());
  let location = match coordinates {
    Some(c) => format!("Location Link: {}", c.map_link()),
    None => NO_LOCATION.to_string(),
  };

  let body = format!(
    "The user, {username}, has triggered an SOS alert.\n\n\
     Timestamp: {}\n\
     User Message: {}\n\
     {location}",
    at.format("%Y-%m-%d %H:%M:%S UTC"),
    message.unwrap_or(DEFAULT_EMAIL_MESSAGE),
  );

  let sms_body = format!(
    "SOS from {username}. Msg: {}. {location}",
    message.unwrap_or(DEFAULT_SMS_MESSAGE),
  );

  SosMessage {
    subject: format!("🚨 URGENT: SOS Alert from {app_name}"),
    body,
    sms_body,
  }
}
