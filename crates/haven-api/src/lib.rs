//! HTTP API for the Haven safety backend.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/health` | Liveness probe |
//! | `POST` | `/sos/trigger` | Validate, record an alert, notify trusted contacts |
//! | `GET`  | `/users/{id}/alerts` | A user's alerts, newest first |

pub mod alerts;
pub mod error;
pub mod sos;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use haven_core::store::SafetyStore;
use haven_sos::{Notifier, SosDispatcher};
use serde_json::{Value, json};

pub use error::ApiError;

/// Build the API router around a dispatcher.
pub fn router<S, N>(dispatcher: Arc<SosDispatcher<S, N>>) -> Router<()>
where
  S: SafetyStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    .route("/health", get(health))
    .route("/sos/trigger", post(sos::trigger::<S, N>))
    .route("/users/{id}/alerts", get(alerts::list::<S, N>))
    .with_state(dispatcher)
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::{collections::HashSet, sync::Mutex};

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use haven_core::contact::NewTrustedContact;
  use haven_sos::{ContactFanout, channel::NotificationChannel, config::NotifyConfig};
  use haven_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  #[derive(Default)]
  struct FakeChannel {
    sent:    Mutex<Vec<String>>,
    failing: HashSet<String>,
  }

  impl NotificationChannel for FakeChannel {
    async fn send(&self, recipient: &str, _: &str, _: &str) -> bool {
      self.sent.lock().unwrap().push(recipient.to_owned());
      !self.failing.contains(recipient)
    }
  }

  type Dispatcher = SosDispatcher<SqliteStore, ContactFanout<FakeChannel, FakeChannel>>;

  async fn make_dispatcher(email: FakeChannel) -> Arc<Dispatcher> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let fanout = ContactFanout::new(email, FakeChannel::default(), NotifyConfig::default());
    Arc::new(SosDispatcher::new(Arc::new(store), fanout))
  }

  async fn add_user(d: &Dispatcher, name: &str) -> i64 {
    d.store()
      .add_user(name.into(), format!("{name}@example.com"))
      .await
      .unwrap()
      .id
  }

  async fn oneshot_raw(
    dispatcher: Arc<Dispatcher>,
    method:     &str,
    uri:        &str,
    body:       &str,
  ) -> (StatusCode, Value) {
    let req = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    let resp = router(dispatcher).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
  }

  async fn trigger(dispatcher: Arc<Dispatcher>, body: Value) -> (StatusCode, Value) {
    oneshot_raw(dispatcher, "POST", "/sos/trigger", &body.to_string()).await
  }

  // ── Trigger ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn trigger_notifies_email_contact_only() {
    let d = make_dispatcher(FakeChannel::default()).await;
    let uid = add_user(&d, "alice").await;
    d.store()
      .add_contact(NewTrustedContact::new(uid, "Mum").with_email("mum@example.com"))
      .await
      .unwrap();
    d.store()
      .add_contact(NewTrustedContact::new(uid, "Dad").with_phone("+15550001"))
      .await
      .unwrap();

    let (status, body) = trigger(
      d.clone(),
      json!({ "user_id": uid, "risk_level": "high", "message": "help" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let alert_id = body["alert_id"].as_i64().unwrap();
    assert_eq!(
      body,
      json!({
        "success": true,
        "alert_id": alert_id,
        "contacts_notified": 1,
        "message": "Alert saved. 1 contacts notified successfully.",
      })
    );
  }

  #[tokio::test]
  async fn failing_email_still_returns_200() {
    let email = FakeChannel {
      failing: HashSet::from(["mum@example.com".to_string()]),
      ..FakeChannel::default()
    };
    let d = make_dispatcher(email).await;
    let uid = add_user(&d, "bob").await;
    d.store()
      .add_contact(NewTrustedContact::new(uid, "Mum").with_email("mum@example.com"))
      .await
      .unwrap();

    let (status, body) = trigger(d, json!({ "user_id": uid, "risk_level": "low" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["alert_id"].is_i64());
    assert_eq!(body["contacts_notified"], json!(0));
  }

  #[tokio::test]
  async fn unknown_user_returns_404_detail() {
    let d = make_dispatcher(FakeChannel::default()).await;

    let (status, body) = trigger(d, json!({ "user_id": 42, "risk_level": "high" })).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "User not found." }));
  }

  #[tokio::test]
  async fn invalid_payload_returns_field_errors() {
    let d = make_dispatcher(FakeChannel::default()).await;

    let (status, body) = trigger(
      d,
      json!({ "risk_level": "much too long", "location": { "latitude": 1.0 } }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
      body,
      json!({
        "user_id": ["This field is required."],
        "risk_level": ["Ensure this field has no more than 10 characters."],
        "location": { "longitude": ["This field is required."] },
      })
    );
  }

  #[tokio::test]
  async fn malformed_json_returns_400_detail() {
    let d = make_dispatcher(FakeChannel::default()).await;

    let (status, body) = oneshot_raw(d, "POST", "/sos/trigger", "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
  }

  // ── Alerts ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn repeated_triggers_list_two_alerts() {
    let d = make_dispatcher(FakeChannel::default()).await;
    let uid = add_user(&d, "cat").await;
    let payload = json!({ "user_id": uid, "risk_level": "high" });

    let (_, first) = trigger(d.clone(), payload.clone()).await;
    let (_, second) = trigger(d.clone(), payload).await;

    let (status, body) =
      oneshot_raw(d, "GET", &format!("/users/{uid}/alerts"), "").await;
    assert_eq!(status, StatusCode::OK);

    let alerts = body.as_array().unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0]["id"], second["alert_id"]);
    assert_eq!(alerts[1]["id"], first["alert_id"]);
    assert!(alerts.iter().all(|a| a["risk_score"] == json!(1.0)));
    assert!(alerts.iter().all(|a| a["resolved"] == json!(false)));
  }

  #[tokio::test]
  async fn alerts_for_unknown_user_return_404() {
    let d = make_dispatcher(FakeChannel::default()).await;
    let (status, body) = oneshot_raw(d, "GET", "/users/5/alerts", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "User not found." }));
  }

  #[tokio::test]
  async fn health_reports_ok() {
    let d = make_dispatcher(FakeChannel::default()).await;
    let (status, body) = oneshot_raw(d, "GET", "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
  }
}
