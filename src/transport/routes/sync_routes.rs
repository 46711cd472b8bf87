use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State, rejection::JsonRejection},
};
use serde::Deserialize;

use crate::{
  common::{ApiError, ApiResult},
  server::AppState,
  spotify::sync::{self, SyncAction, SyncReport},
};

#[derive(Debug, Default, Deserialize)]
pub struct SyncQuery {
  pub action: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncRequest {
  pub tokens: Option<Vec<String>>,
  pub track_uri: Option<String>,
  pub position: Option<u64>,
}

/// POST /api/sync?action=... — fire the action at every supplied token and
/// report per-token outcomes. The batch itself never fails on one token.
pub async fn handle(
  State(state): State<Arc<AppState>>,
  Query(query): Query<SyncQuery>,
  body: Result<Option<Json<SyncRequest>>, JsonRejection>,
) -> ApiResult<Json<SyncReport>> {
  let action = query.action.ok_or(ApiError::MissingField("action"))?;
  let body = body
    .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?
    .map(|Json(b)| b)
    .unwrap_or_default();
  let tokens = body.tokens.ok_or(ApiError::MissingField("tokens"))?;

  let action = SyncAction::parse(&action, body.track_uri, body.position)
    .ok_or_else(|| ApiError::UnknownAction(action.clone()))?;

  tracing::debug!("sync fan-out: {:?} across {} tokens", action, tokens.len());
  let report = sync::dispatch(&state.http, &tokens, &action).await;
  Ok(Json(report))
}
