//! Trusted contacts — the people notified when a user triggers SOS.

use serde::{Deserialize, Serialize};

use crate::user::UserId;

pub type ContactId = i64;

/// Default priority assigned when the caller does not supply one.
pub const DEFAULT_PRIORITY: i32 = 1;

/// A person a user has designated to receive SOS notifications.
///
/// A `(user_id, email)` pair is unique whenever `email` is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedContact {
  pub id:           ContactId,
  pub user_id:      UserId,
  pub name:         String,
  pub email:        Option<String>,
  pub phone_number: Option<String>,
  /// Lower number means higher priority.
  pub priority:     i32,
  pub sos_enabled:  bool,
}

impl TrustedContact {
  /// `true` if the contact has neither an email address nor a phone number.
  pub fn is_unreachable(&self) -> bool {
    self.email.is_none() && self.phone_number.is_none()
  }
}

/// Input to [`crate::store::SafetyStore::add_contact`].
#[derive(Debug, Clone)]
pub struct NewTrustedContact {
  pub user_id:      UserId,
  pub name:         String,
  pub email:        Option<String>,
  pub phone_number: Option<String>,
  pub priority:     i32,
  pub sos_enabled:  bool,
}

impl NewTrustedContact {
  /// A contact with no channels, default priority, and SOS enabled.
  pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
    Self {
      user_id,
      name: name.into(),
      email: None,
      phone_number: None,
      priority: DEFAULT_PRIORITY,
      sos_enabled: true,
    }
  }

  pub fn with_email(mut self, email: impl Into<String>) -> Self {
    self.email = Some(email.into());
    self
  }

  pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
    self.phone_number = Some(phone.into());
    self
  }

  pub fn with_priority(mut self, priority: i32) -> Self {
    self.priority = priority;
    self
  }

  pub fn disabled(mut self) -> Self {
    self.sos_enabled = false;
    self
  }
}
