use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  common::{ApiError, ApiResult},
  server::AppState,
  spotify::search,
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
  pub query: Option<String>,
  pub token: Option<String>,
}

/// GET /api/search?query=...&token=...
pub async fn handle(
  State(state): State<Arc<AppState>>,
  Query(params): Query<SearchQuery>,
) -> ApiResult<Json<Value>> {
  let query = params.query.ok_or(ApiError::MissingField("query"))?;
  let token = params.token.ok_or(ApiError::MissingField("token"))?;

  let tracks = search::search_tracks(&state.http, &token, &query).await?;
  Ok(Json(json!({ "tracks": tracks })))
}
