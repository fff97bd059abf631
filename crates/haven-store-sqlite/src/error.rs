//! Error type for `haven-store-sqlite`.

use haven_core::user::UserId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] haven_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("user not found: {0}")]
  UserNotFound(UserId),

  #[error("username or email already registered: {0:?}")]
  DuplicateUser(String),

  #[error("user {user_id} already has a trusted contact with email {email:?}")]
  DuplicateContact { user_id: UserId, email: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
