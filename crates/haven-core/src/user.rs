//! User records, owned by the external user directory.

use serde::{Deserialize, Serialize};

/// Primary key of a user row.
pub type UserId = i64;

/// A registered user. The SOS core only ever reads this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:       UserId,
  pub username: String,
  pub email:    String,
}
