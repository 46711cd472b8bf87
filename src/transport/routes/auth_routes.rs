use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State, rejection::JsonRejection},
  response::Redirect,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  common::{ApiError, ApiResult},
  server::AppState,
  spotify::auth,
};

/// GET /api/auth/login — hand the browser to Spotify's consent page.
pub async fn login(State(state): State<Arc<AppState>>) -> Redirect {
  Redirect::temporary(&auth::authorize_url(&state.config.spotify))
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
  pub code: Option<String>,
  pub error: Option<String>,
}

/// GET /api/auth/callback — exchange the authorization code and send the
/// browser back to the frontend with the tokens in the URL. Failures also go
/// back to the frontend, as `?error=`, since there is no API caller to 4xx.
pub async fn callback(
  State(state): State<Arc<AppState>>,
  Query(query): Query<CallbackQuery>,
) -> Redirect {
  let frontend = &state.config.spotify.frontend_url;

  if let Some(error) = query.error {
    return Redirect::temporary(&format!(
      "{}?error={}",
      frontend,
      urlencoding::encode(&error)
    ));
  }
  let Some(code) = query.code else {
    return Redirect::temporary(&format!("{}?error=missing_code", frontend));
  };

  match auth::exchange_code(&state.http, &state.config.spotify, &code).await {
    Ok(tokens) => {
      let refresh = tokens.refresh_token.unwrap_or_default();
      Redirect::temporary(&format!(
        "{}#access_token={}&refresh_token={}&expires_in={}",
        frontend,
        urlencoding::encode(&tokens.access_token),
        urlencoding::encode(&refresh),
        tokens.expires_in,
      ))
    }
    Err(err) => {
      tracing::warn!("token exchange failed: {}", err);
      Redirect::temporary(&format!(
        "{}?error={}",
        frontend,
        urlencoding::encode(&err.to_string())
      ))
    }
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshRequest {
  pub refresh_token: Option<String>,
}

/// POST /api/auth/refresh — trade a refresh token for a new access token.
pub async fn refresh(
  State(state): State<Arc<AppState>>,
  body: Result<Option<Json<RefreshRequest>>, JsonRejection>,
) -> ApiResult<Json<Value>> {
  let refresh_token = body
    .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?
    .and_then(|Json(b)| b.refresh_token)
    .ok_or(ApiError::MissingField("refreshToken"))?;

  let tokens = auth::refresh_token(&state.http, &state.config.spotify, &refresh_token).await?;
  Ok(Json(json!({
    "accessToken": tokens.access_token,
    "refreshToken": tokens.refresh_token,
    "expiresIn": tokens.expires_in,
  })))
}
