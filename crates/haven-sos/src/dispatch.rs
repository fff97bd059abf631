//! [`SosDispatcher`] — the end-to-end SOS flow.

use std::sync::Arc;

use haven_core::{
  alert::{AlertId, NewSafetyAlert, RiskScore},
  store::SafetyStore,
};
use serde::Serialize;

use crate::{error::DispatchError, fanout::Notifier, request::TriggerRequest};

/// Response body for a completed trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
  pub success:           bool,
  pub alert_id:          AlertId,
  /// Contacts whose email was accepted by the transport.
  pub contacts_notified: usize,
  pub message:           String,
}

impl DispatchResult {
  fn new(alert_id: AlertId, contacts_notified: usize) -> Self {
    Self {
      success: true,
      alert_id,
      contacts_notified,
      message: format!("Alert saved. {contacts_notified} contacts notified successfully."),
    }
  }
}

/// Trigger description recorded on the alert.
pub fn trigger_description(source_character: Option<&str>) -> String {
  let source = source_character
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .unwrap_or("Unknown");
  format!("SOS Initiated. Source: {source}")
}

/// Validates a trigger, records the alert, and notifies trusted contacts.
///
/// The alert is persisted before any notification is attempted, so channel
/// failures can lower `contacts_notified` but never lose the alert. Every
/// call creates a new alert; identical triggers are not deduplicated.
pub struct SosDispatcher<S, N> {
  store:    Arc<S>,
  notifier: N,
}

impl<S, N> SosDispatcher<S, N>
where
  S: SafetyStore,
  N: Notifier,
{
  pub fn new(store: Arc<S>, notifier: N) -> Self { Self { store, notifier } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  #[tracing::instrument(skip_all, fields(user_id = request.user_id))]
  pub async fn trigger(
    &self,
    request: TriggerRequest,
  ) -> Result<DispatchResult, DispatchError> {
    request.validate()?;

    let user = self
      .store
      .get_user(request.user_id)
      .await
      .map_err(DispatchError::store)?
      .ok_or(DispatchError::UserNotFound(request.user_id))?;

    // An SOS is always maximum risk; `risk_level` is advisory text only.
    let alert = self
      .store
      .record_alert(NewSafetyAlert {
        user_id:             user.id,
        chat_session_id:     None,
        alert_level:         request.risk_level.clone(),
        trigger_description: trigger_description(request.source_character.as_deref()),
        risk_score:          RiskScore::MAX,
      })
      .await
      .map_err(DispatchError::store)?;
    tracing::info!(alert_id = alert.id, risk_level = %alert.alert_level, "SOS alert recorded");

    let contacts = self
      .store
      .list_contacts(user.id, true)
      .await
      .map_err(DispatchError::store)?;

    let notified = self
      .notifier
      .notify(
        &user,
        &contacts,
        request.location.map(|l| l.coordinates()),
        request.message.as_deref(),
      )
      .await;

    Ok(DispatchResult::new(alert.id, notified))
  }
}
