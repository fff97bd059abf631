//! Error types for `haven-sos`.

use std::time::Duration;

use haven_core::user::UserId;
use thiserror::Error;

use crate::request::ValidationErrors;

/// A failure inside a notification transport.
///
/// Never escapes a [`NotificationChannel`](crate::channel::NotificationChannel);
/// channels log it and report `false` (email) or fall back (SMS).
#[derive(Debug, Error)]
pub enum TransportError {
  #[error("invalid email address: {0}")]
  Address(#[from] lettre::address::AddressError),

  #[error("could not build email: {0}")]
  Message(#[from] lettre::error::Error),

  #[error("smtp error: {0}")]
  Smtp(#[from] lettre::transport::smtp::Error),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("provider rejected the message: {0}")]
  Rejected(String),

  #[error("timed out after {0:?}")]
  Timeout(Duration),

  #[error("configuration error: {0}")]
  Config(String),
}

/// A user-visible failure of [`SosDispatcher::trigger`](crate::SosDispatcher::trigger).
#[derive(Debug, Error)]
pub enum DispatchError {
  #[error("invalid request: {0}")]
  Validation(#[from] ValidationErrors),

  #[error("user not found: {0}")]
  UserNotFound(UserId),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DispatchError {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}
