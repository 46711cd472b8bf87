use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
  common::{ApiError, ApiResult},
  server::AppState,
  spotify::player::{self, PlayerAction, PlayerRequest},
};

#[derive(Debug, Default, Deserialize)]
pub struct PlayerQuery {
  pub action: Option<String>,
  pub token: Option<String>,
}

/// /api/player?action=...&token=... — one Spotify call per request, using
/// the caller's own bearer token.
pub async fn handle(
  State(state): State<Arc<AppState>>,
  Query(query): Query<PlayerQuery>,
  body: Result<Option<Json<PlayerRequest>>, JsonRejection>,
) -> ApiResult<Json<Value>> {
  let action = query.action.ok_or(ApiError::MissingField("action"))?;
  let token = query.token.ok_or(ApiError::MissingField("token"))?;
  let action =
    PlayerAction::parse(&action).ok_or_else(|| ApiError::UnknownAction(action.clone()))?;
  let body = body
    .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?
    .map(|Json(b)| b)
    .unwrap_or_default();

  tracing::debug!("player action: {:?}", action);
  let result = player::execute(&state.http, &token, action, &body).await?;
  Ok(Json(result))
}
