//! Safety alerts — one row per SOS trigger.
//!
//! Alerts are written exactly once. The only field ever changed afterwards is
//! `resolved`, and that belongs to a resolution workflow outside this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, user::UserId};

pub type AlertId = i64;

/// Identifier of the chat session an alert was raised from.
pub type ChatSessionId = i64;

// ─── Risk score ──────────────────────────────────────────────────────────────

/// A risk score in the closed interval `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct RiskScore(f64);

impl RiskScore {
  pub const MIN: Self = Self(0.0);
  /// The score recorded for every SOS trigger.
  pub const MAX: Self = Self(1.0);

  pub fn new(value: f64) -> Result<Self> {
    if (0.0..=1.0).contains(&value) {
      Ok(Self(value))
    } else {
      Err(Error::RiskScoreOutOfRange(value))
    }
  }

  pub fn value(self) -> f64 { self.0 }
}

impl TryFrom<f64> for RiskScore {
  type Error = Error;

  fn try_from(value: f64) -> Result<Self> { Self::new(value) }
}

impl From<RiskScore> for f64 {
  fn from(score: RiskScore) -> Self { score.0 }
}

// ─── Alert ───────────────────────────────────────────────────────────────────

/// A persisted safety alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyAlert {
  pub id:                  AlertId,
  pub user_id:             UserId,
  pub chat_session_id:     Option<ChatSessionId>,
  /// Advisory severity text supplied by the caller, e.g. `"low"` or `"high"`.
  pub alert_level:         String,
  pub trigger_description: String,
  pub risk_score:          RiskScore,
  pub resolved:            bool,
  /// Server-assigned; never changes after creation.
  pub created_at:          DateTime<Utc>,
}

/// Input to [`crate::store::SafetyStore::record_alert`].
/// `id`, `created_at` and `resolved` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewSafetyAlert {
  pub user_id:             UserId,
  pub chat_session_id:     Option<ChatSessionId>,
  pub alert_level:         String,
  pub trigger_description: String,
  pub risk_score:          RiskScore,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn risk_score_bounds_are_inclusive() {
    assert_eq!(RiskScore::new(0.0).unwrap(), RiskScore::MIN);
    assert_eq!(RiskScore::new(1.0).unwrap(), RiskScore::MAX);
    assert!(RiskScore::new(0.42).is_ok());
  }

  #[test]
  fn risk_score_rejects_out_of_range() {
    assert!(matches!(
      RiskScore::new(1.01),
      Err(Error::RiskScoreOutOfRange(v)) if v == 1.01
    ));
    assert!(RiskScore::new(-0.1).is_err());
    assert!(RiskScore::new(f64::NAN).is_err());
  }

  #[test]
  fn risk_score_deserialize_validates() {
    let ok: RiskScore = serde_json::from_str("0.5").unwrap();
    assert_eq!(ok.value(), 0.5);
    assert!(serde_json::from_str::<RiskScore>("3.0").is_err());
  }
}
