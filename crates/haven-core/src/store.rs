//! The `SafetyStore` trait.
//!
//! Implemented by storage backends (e.g. `haven-store-sqlite`). The SOS
//! dispatcher and the HTTP layer depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::{
  alert::{NewSafetyAlert, SafetyAlert},
  contact::{NewTrustedContact, TrustedContact},
  user::{User, UserId},
};

/// Abstraction over the relational store behind the safety backend: a user
/// directory, the trusted-contact table, and the alert log.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait SafetyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Look up a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Register a new user. Username and email must both be unique.
  fn add_user(
    &self,
    username: String,
    email: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  // ── Trusted contacts ──────────────────────────────────────────────────

  /// Persist a trusted contact for an existing user.
  ///
  /// Fails if the user does not exist or already has a contact with the same
  /// email address.
  fn add_contact(
    &self,
    input: NewTrustedContact,
  ) -> impl Future<Output = Result<TrustedContact, Self::Error>> + Send + '_;

  /// Return a user's contacts ordered by `priority` then id.
  ///
  /// With `sos_enabled_only`, contacts that opted out of SOS notification
  /// are skipped.
  fn list_contacts(
    &self,
    user_id: UserId,
    sos_enabled_only: bool,
  ) -> impl Future<Output = Result<Vec<TrustedContact>, Self::Error>> + Send + '_;

  // ── Alerts ────────────────────────────────────────────────────────────

  /// Insert a new alert and return the persisted row. The store assigns the
  /// id and creation timestamp; `resolved` starts out `false`.
  fn record_alert(
    &self,
    input: NewSafetyAlert,
  ) -> impl Future<Output = Result<SafetyAlert, Self::Error>> + Send + '_;

  /// All alerts for a user, newest first.
  fn list_alerts(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<SafetyAlert>, Self::Error>> + Send + '_;
}
