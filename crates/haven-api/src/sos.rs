//! Handler for `POST /sos/trigger`.
//!
//! | Status | Body |
//! |--------|------|
//! | 200 | [`DispatchResult`] |
//! | 400 | per-field validation messages, or `{"detail": ...}` for a body that is not JSON |
//! | 404 | `{"detail": "User not found."}` |

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use haven_core::store::SafetyStore;
use haven_sos::{DispatchResult, Notifier, SosDispatcher, TriggerRequest};
use serde_json::Value;

use crate::error::ApiError;

/// `POST /sos/trigger`
pub async fn trigger<S, N>(
  State(dispatcher): State<Arc<SosDispatcher<S, N>>>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DispatchResult>, ApiError>
where
  S: SafetyStore + 'static,
  N: Notifier + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let request = TriggerRequest::from_json(&body)?;
  let result = dispatcher.trigger(request).await?;
  Ok(Json(result))
}
