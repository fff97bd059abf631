//! Handler for `GET /users/{id}/alerts`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use haven_core::{alert::SafetyAlert, store::SafetyStore, user::UserId};
use haven_sos::{Notifier, SosDispatcher};

use crate::error::{ApiError, USER_NOT_FOUND};

/// `GET /users/{id}/alerts`, newest first. 404 if the user is unknown.
pub async fn list<S, N>(
  State(dispatcher): State<Arc<SosDispatcher<S, N>>>,
  Path(user_id): Path<UserId>,
) -> Result<Json<Vec<SafetyAlert>>, ApiError>
where
  S: SafetyStore + 'static,
  N: Notifier + 'static,
{
  let store = dispatcher.store();

  store
    .get_user(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

  let alerts = store.list_alerts(user_id).await.map_err(ApiError::store)?;
  Ok(Json(alerts))
}
