//! Conversions between SQLite rows and domain types.
//!
//! Timestamps are stored as RFC 3339 strings; booleans as 0/1 integers.

use chrono::{DateTime, Utc};
use haven_core::{
  alert::{RiskScore, SafetyAlert},
  contact::TrustedContact,
  user::User,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row mappers ─────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "id, username, email";

pub fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
  Ok(User {
    id:       row.get(0)?,
    username: row.get(1)?,
    email:    row.get(2)?,
  })
}

pub const CONTACT_COLUMNS: &str =
  "id, user_id, name, email, phone_number, priority, sos_enabled";

pub fn contact_from_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<TrustedContact> {
  Ok(TrustedContact {
    id:           row.get(0)?,
    user_id:      row.get(1)?,
    name:         row.get(2)?,
    email:        row.get(3)?,
    phone_number: row.get(4)?,
    priority:     row.get(5)?,
    sos_enabled:  row.get(6)?,
  })
}

pub const ALERT_COLUMNS: &str = "id, user_id, chat_session_id, alert_level, \
                                 trigger_description, risk_score, resolved, \
                                 created_at";

/// An alert row before its score and timestamp have been validated.
pub struct RawAlert {
  pub id:                  i64,
  pub user_id:             i64,
  pub chat_session_id:     Option<i64>,
  pub alert_level:         String,
  pub trigger_description: String,
  pub risk_score:          f64,
  pub resolved:            bool,
  pub created_at:          String,
}

impl RawAlert {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      user_id:             row.get(1)?,
      chat_session_id:     row.get(2)?,
      alert_level:         row.get(3)?,
      trigger_description: row.get(4)?,
      risk_score:          row.get(5)?,
      resolved:            row.get(6)?,
      created_at:          row.get(7)?,
    })
  }

  pub fn into_alert(self) -> Result<SafetyAlert> {
    Ok(SafetyAlert {
      id:                  self.id,
      user_id:             self.user_id,
      chat_session_id:     self.chat_session_id,
      alert_level:         self.alert_level,
      trigger_description: self.trigger_description,
      risk_score:          RiskScore::new(self.risk_score)?,
      resolved:            self.resolved,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

/// `true` if `err` is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}
