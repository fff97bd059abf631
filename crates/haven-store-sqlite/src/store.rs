//! [`SqliteStore`] — the SQLite implementation of [`SafetyStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use haven_core::{
  alert::{NewSafetyAlert, SafetyAlert},
  contact::{NewTrustedContact, TrustedContact},
  store::SafetyStore,
  user::{User, UserId},
};

use crate::{
  Error, Result,
  encode::{
    ALERT_COLUMNS, CONTACT_COLUMNS, RawAlert, USER_COLUMNS, contact_from_row,
    encode_dt, is_unique_violation, user_from_row,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Haven store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SafetyStore impl ────────────────────────────────────────────────────────

impl SafetyStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    let user = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            rusqlite::params![id],
            user_from_row,
          )
          .optional()?)
      })
      .await?;
    Ok(user)
  }

  async fn add_user(&self, username: String, email: String) -> Result<User> {
    let at_str = encode_dt(Utc::now());
    let (name, addr) = (username.clone(), email.clone());

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO users (username, email, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![name, addr, at_str],
        ) {
          Ok(_) => Ok(Some(conn.last_insert_rowid())),
          Err(e) if is_unique_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    let id = id.ok_or_else(|| Error::DuplicateUser(username.clone()))?;
    Ok(User { id, username, email })
  }

  // ── Trusted contacts ──────────────────────────────────────────────────────

  async fn add_contact(&self, input: NewTrustedContact) -> Result<TrustedContact> {
    if self.get_user(input.user_id).await?.is_none() {
      return Err(Error::UserNotFound(input.user_id));
    }

    let row = input.clone();
    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO trusted_contacts
             (user_id, name, email, phone_number, priority, sos_enabled)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            row.user_id,
            row.name,
            row.email,
            row.phone_number,
            row.priority,
            row.sos_enabled,
          ],
        ) {
          Ok(_) => Ok(Some(conn.last_insert_rowid())),
          Err(e) if is_unique_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    let Some(id) = id else {
      return Err(Error::DuplicateContact {
        user_id: input.user_id,
        email:   input.email.unwrap_or_default(),
      });
    };

    Ok(TrustedContact {
      id,
      user_id:      input.user_id,
      name:         input.name,
      email:        input.email,
      phone_number: input.phone_number,
      priority:     input.priority,
      sos_enabled:  input.sos_enabled,
    })
  }

  async fn list_contacts(
    &self,
    user_id:          UserId,
    sos_enabled_only: bool,
  ) -> Result<Vec<TrustedContact>> {
    let contacts = self
      .conn
      .call(move |conn| {
        let filter = if sos_enabled_only { "AND sos_enabled = 1" } else { "" };
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTACT_COLUMNS} FROM trusted_contacts
           WHERE user_id = ?1 {filter}
           ORDER BY priority ASC, id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], contact_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(contacts)
  }

  // ── Alerts ────────────────────────────────────────────────────────────────

  async fn record_alert(&self, input: NewSafetyAlert) -> Result<SafetyAlert> {
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let row        = input.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO safety_alerts (
             user_id, chat_session_id, alert_level, trigger_description,
             risk_score, resolved, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
          rusqlite::params![
            row.user_id,
            row.chat_session_id,
            row.alert_level,
            row.trigger_description,
            row.risk_score.value(),
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(SafetyAlert {
      id,
      user_id:             input.user_id,
      chat_session_id:     input.chat_session_id,
      alert_level:         input.alert_level,
      trigger_description: input.trigger_description,
      risk_score:          input.risk_score,
      resolved:            false,
      created_at,
    })
  }

  async fn list_alerts(&self, user_id: UserId) -> Result<Vec<SafetyAlert>> {
    let raws: Vec<RawAlert> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ALERT_COLUMNS} FROM safety_alerts
           WHERE user_id = ?1
           ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], RawAlert::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAlert::into_alert).collect()
  }
}
