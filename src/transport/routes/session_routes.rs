use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  common::{ApiError, ApiResult, now_ms},
  server::AppState,
  session::actions,
  session::code::{generate_code, normalize_code},
  session::model::{SESSION_TTL_SECS, Session, SettingsPatch, Track},
};

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
  pub action: Option<String>,
  /// Accepted in the query string as well, for plain GET polling.
  pub code: Option<String>,
}

/// One envelope for every action; handlers pick the fields they need and 400
/// on what is missing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionRequest {
  pub code: Option<String>,
  pub host_id: Option<String>,
  pub host_name: Option<String>,
  pub host_token: Option<String>,
  pub guest_id: Option<String>,
  pub guest_name: Option<String>,
  pub token: Option<String>,
  pub track: Option<Track>,
  pub track_id: Option<String>,
  pub voter: Option<String>,
  pub requester: Option<String>,
  pub requester_id: Option<String>,
  pub added_by: Option<String>,
  pub added_by_id: Option<String>,
  pub emoji: Option<String>,
  pub user: Option<String>,
  pub settings: Option<SettingsPatch>,
}

/// POST/GET /api/session?action=...
pub async fn handle(
  State(state): State<Arc<AppState>>,
  Query(query): Query<SessionQuery>,
  body: Result<Option<Json<SessionRequest>>, JsonRejection>,
) -> ApiResult<Json<Value>> {
  let action = query.action.ok_or(ApiError::MissingField("action"))?;
  // a malformed body still gets the `{"error": ...}` shape, not axum's
  // plain-text rejection
  let body = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
  let mut body = body.map(|Json(b)| b).unwrap_or_default();
  if body.code.is_none() {
    body.code = query.code;
  }
  tracing::debug!("session action: {}", action);

  match action.as_str() {
    "create" => create(&state, body).await,
    "join" => join(&state, body).await,
    "leave" => leave(&state, body).await,
    "end" => end(&state, body).await,
    "get" => get(&state, body).await,
    "history" => history(&state, body).await,
    "add-track" => add_track(&state, body).await,
    "remove-track" => remove_track(&state, body).await,
    "vote" => vote(&state, body).await,
    "play-next" => play_next(&state, body).await,
    "update-track" => update_track(&state, body).await,
    "update-settings" => update_settings(&state, body).await,
    "react" => react(&state, body).await,
    "request-play" => request_play(&state, body).await,
    "clear-request" => clear_request(&state, body).await,
    "update-token" => update_token(&state, body).await,
    "get-all-tokens" => get_all_tokens(&state, body).await,
    other => Err(ApiError::UnknownAction(other.to_string())),
  }
}

fn require<T>(value: Option<T>, field: &'static str) -> ApiResult<T> {
  value.ok_or(ApiError::MissingField(field))
}

async fn load(state: &AppState, code: &str) -> ApiResult<Session> {
  state
    .store
    .get(code)
    .await?
    .ok_or_else(|| ApiError::session_not_found(&normalize_code(code)))
}

async fn persist(state: &AppState, session: &Session) -> ApiResult<()> {
  state
    .store
    .set(&session.code, session, SESSION_TTL_SECS)
    .await?;
  Ok(())
}

async fn create(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let host_id = require(body.host_id, "hostId")?;
  let host_name = require(body.host_name, "hostName")?;
  let host_token = require(body.host_token, "hostToken")?;

  let session = Session::new(generate_code(), host_id, host_name, host_token);
  persist(state, &session).await?;
  tracing::info!("session created: {}", session.code);

  Ok(Json(json!({
    "success": true,
    "code": session.code,
    "hostId": session.host_id,
    "hostName": session.host_name,
    "createdAt": session.created_at,
    "settings": session.settings,
  })))
}

async fn join(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let guest_name = require(body.guest_name, "guestName")?;
  let guest_id = body.guest_id.unwrap_or_else(|| now_ms().to_string());

  let mut session = load(state, &code).await?;
  actions::join(
    &mut session,
    guest_id.clone(),
    guest_name,
    body.token,
    now_ms(),
  );
  persist(state, &session).await?;

  Ok(Json(json!({
    "success": true,
    "guestId": guest_id,
    "session": session.view(),
  })))
}

/// A client may race session teardown, so leaving a session that no longer
/// exists counts as having left it.
async fn leave(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let guest_id = require(body.guest_id, "guestId")?;

  if let Some(mut session) = state.store.get(&code).await? {
    actions::leave(&mut session, &guest_id, now_ms());
    persist(state, &session).await?;
  }
  Ok(Json(json!({ "success": true })))
}

async fn end(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let deleted = state.store.delete(&code).await?;
  if deleted {
    tracing::info!("session ended: {}", normalize_code(&code));
  }
  Ok(Json(json!({ "success": true })))
}

async fn get(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let mut session = load(state, &code).await?;

  // lazy reaction cleanup: only write back when something actually expired
  if actions::prune_reactions(&mut session, now_ms()) {
    persist(state, &session).await?;
  }
  Ok(Json(json!({ "success": true, "session": session.view() })))
}

async fn history(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let session = load(state, &code).await?;
  Ok(Json(json!({ "success": true, "history": session.history })))
}

async fn add_track(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let track = require(body.track, "track")?;
  let added_by = require(body.added_by, "addedBy")?;
  let added_by_id = body.added_by_id.unwrap_or_else(|| added_by.clone());

  let mut session = load(state, &code).await?;
  actions::add_track(&mut session, track, added_by, added_by_id, now_ms())?;
  persist(state, &session).await?;
  Ok(Json(json!({ "success": true, "session": session.view() })))
}

async fn remove_track(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let track_id = require(body.track_id, "trackId")?;
  let requester = require(body.requester, "requester")?;

  let mut session = load(state, &code).await?;
  actions::remove_track(&mut session, &track_id, &requester, now_ms())?;
  persist(state, &session).await?;
  Ok(Json(json!({ "success": true, "session": session.view() })))
}

async fn vote(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let track_id = require(body.track_id, "trackId")?;
  let voter = require(body.voter, "voter")?;

  let mut session = load(state, &code).await?;
  let votes = actions::vote(&mut session, &track_id, &voter, now_ms())?;
  persist(state, &session).await?;
  Ok(Json(json!({
    "success": true,
    "votes": votes,
    "session": session.view(),
  })))
}

/// Pops the queue head and hands back every stored bearer token so the caller
/// can fan playback out to all linked devices.
async fn play_next(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;

  let mut session = load(state, &code).await?;
  let track = actions::play_next(&mut session, now_ms())?;
  let tokens = actions::all_tokens(&session);
  persist(state, &session).await?;
  Ok(Json(json!({
    "success": true,
    "track": track,
    "tokens": tokens,
    "session": session.view(),
  })))
}

/// The caller already started this track (play-specific-track flow); record
/// it as current with the same history semantics as play-next.
async fn update_track(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let track = require(body.track, "track")?;

  let mut session = load(state, &code).await?;
  actions::set_current_track(&mut session, track, now_ms());
  persist(state, &session).await?;
  Ok(Json(json!({ "success": true, "session": session.view() })))
}

async fn update_settings(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let patch = require(body.settings, "settings")?;

  let mut session = load(state, &code).await?;
  actions::update_settings(&mut session, &patch, now_ms());
  persist(state, &session).await?;
  Ok(Json(json!({ "success": true, "settings": session.settings })))
}

async fn react(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let emoji = require(body.emoji, "emoji")?;
  let user = require(body.user, "user")?;

  let mut session = load(state, &code).await?;
  actions::react(&mut session, emoji, user, now_ms());
  persist(state, &session).await?;
  Ok(Json(json!({ "success": true, "reactions": session.reactions })))
}

async fn request_play(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let track = require(body.track, "track")?;
  let requester = require(body.requester, "requester")?;
  let requester_id = body.requester_id.unwrap_or_else(|| requester.clone());

  let mut session = load(state, &code).await?;
  actions::request_play(&mut session, track, requester, requester_id, now_ms())?;
  persist(state, &session).await?;
  Ok(Json(json!({
    "success": true,
    "playRequests": session.play_requests,
  })))
}

/// Accepting and dismissing a request both just clear it.
async fn clear_request(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let track_id = require(body.track_id, "trackId")?;

  let mut session = load(state, &code).await?;
  actions::clear_request(&mut session, &track_id, now_ms());
  persist(state, &session).await?;
  Ok(Json(json!({
    "success": true,
    "playRequests": session.play_requests,
  })))
}

/// Token refresh for a guest. Absent session is success: the caller cannot
/// tell "already gone" from "never existed" and should not have to.
async fn update_token(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let guest_id = require(body.guest_id, "guestId")?;
  let token = require(body.token, "token")?;

  if let Some(mut session) = state.store.get(&code).await? {
    actions::update_guest_token(&mut session, &guest_id, token, now_ms());
    persist(state, &session).await?;
  }
  Ok(Json(json!({ "success": true })))
}

/// Host token plus every guest token, host first, for playback fan-out.
async fn get_all_tokens(state: &AppState, body: SessionRequest) -> ApiResult<Json<Value>> {
  let code = require(body.code, "code")?;
  let session = load(state, &code).await?;
  Ok(Json(json!({
    "success": true,
    "tokens": actions::all_tokens(&session),
  })))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::configs::Config;
  use crate::session::code::CODE_ALPHABET;
  use crate::store::MemoryStore;

  fn state() -> Arc<AppState> {
    Arc::new(AppState {
      config: Config::default(),
      store: Arc::new(MemoryStore::new()),
      http: reqwest::Client::new(),
    })
  }

  async fn dispatch(state: &Arc<AppState>, action: &str, body: SessionRequest) -> ApiResult<Value> {
    handle(
      State(state.clone()),
      Query(SessionQuery {
        action: Some(action.to_string()),
        code: None,
      }),
      Ok(Some(Json(body))),
    )
    .await
    .map(|Json(v)| v)
  }

  fn create_body() -> SessionRequest {
    SessionRequest {
      host_id: Some("host-1".into()),
      host_name: Some("Alice".into()),
      host_token: Some("host-token".into()),
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn create_then_get_round_trip() {
    let state = state();
    let created = dispatch(&state, "create", create_body()).await.unwrap();
    let code = created["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    // create never leaks the host token
    assert!(created.get("hostToken").is_none());

    // lookup is case-insensitive
    let got = dispatch(
      &state,
      "get",
      SessionRequest {
        code: Some(code.to_lowercase()),
        ..Default::default()
      },
    )
    .await
    .unwrap();
    let session = &got["session"];
    assert_eq!(session["code"], code.as_str());
    assert_eq!(session["queue"].as_array().unwrap().len(), 0);
    assert_eq!(session["guests"].as_array().unwrap().len(), 0);
    assert_eq!(session["history"].as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn create_requires_host_fields() {
    let state = state();
    let mut body = create_body();
    body.host_token = None;
    let err = dispatch(&state, "create", body).await.unwrap_err();
    assert_eq!(err.to_string(), "missing required field: hostToken");
  }

  #[tokio::test]
  async fn malformed_body_maps_to_json_error_shape() {
    use axum::extract::FromRequest;

    let req = axum::http::Request::builder()
      .method("POST")
      .uri("/api/session?action=create")
      .header("content-type", "application/json")
      .body(axum::body::Body::from("{\"code\":"))
      .unwrap();
    let rejection = Json::<SessionRequest>::from_request(req, &())
      .await
      .unwrap_err();

    let err = handle(
      State(state()),
      Query(SessionQuery {
        action: Some("create".into()),
        code: None,
      }),
      Err(rejection),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
    assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn unknown_action_is_rejected() {
    let state = state();
    let err = dispatch(&state, "shuffle", SessionRequest::default())
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::UnknownAction(_)));
  }

  #[tokio::test]
  async fn get_on_unknown_code_is_not_found() {
    let state = state();
    let err = dispatch(
      &state,
      "get",
      SessionRequest {
        code: Some("ZZZZZZ".into()),
        ..Default::default()
      },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }

  #[tokio::test]
  async fn leave_and_update_token_tolerate_missing_session() {
    let state = state();
    let left = dispatch(
      &state,
      "leave",
      SessionRequest {
        code: Some("GONE42".into()),
        guest_id: Some("g1".into()),
        ..Default::default()
      },
    )
    .await
    .unwrap();
    assert_eq!(left["success"], true);

    let updated = dispatch(
      &state,
      "update-token",
      SessionRequest {
        code: Some("GONE42".into()),
        guest_id: Some("g1".into()),
        token: Some("tok".into()),
        ..Default::default()
      },
    )
    .await
    .unwrap();
    assert_eq!(updated["success"], true);
  }

  #[tokio::test]
  async fn tokens_come_back_host_first_in_join_order() {
    let state = state();
    let created = dispatch(&state, "create", create_body()).await.unwrap();
    let code = created["code"].as_str().unwrap().to_string();

    for (id, name, token) in [("g1", "Bob", "tok1"), ("g2", "Cam", "tok2")] {
      dispatch(
        &state,
        "join",
        SessionRequest {
          code: Some(code.clone()),
          guest_id: Some(id.into()),
          guest_name: Some(name.into()),
          token: Some(token.into()),
          ..Default::default()
        },
      )
      .await
      .unwrap();
    }

    let out = dispatch(
      &state,
      "get-all-tokens",
      SessionRequest {
        code: Some(code),
        ..Default::default()
      },
    )
    .await
    .unwrap();
    assert_eq!(out["tokens"], json!(["host-token", "tok1", "tok2"]));
  }

  #[tokio::test]
  async fn ended_session_code_is_free_again() {
    let state = state();
    let created = dispatch(&state, "create", create_body()).await.unwrap();
    let code = created["code"].as_str().unwrap().to_string();

    dispatch(
      &state,
      "end",
      SessionRequest {
        code: Some(code.clone()),
        ..Default::default()
      },
    )
    .await
    .unwrap();

    let err = dispatch(
      &state,
      "get",
      SessionRequest {
        code: Some(code),
        ..Default::default()
      },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
  }
}
