//! Best-effort playback fan-out: the same action fired at N bearer tokens
//! concurrently, every per-token outcome collected. The Spotify API has no
//! multi-device transaction, so the only contract here is "attempted on every
//! token, no partial-batch abort, per-token result always reported" — not
//! that the devices converge.

use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};

use crate::spotify::{API_BASE, error_message};

#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
  Play {
    track_uri: Option<String>,
    position_ms: u64,
  },
  Pause,
  Resume,
  Seek {
    position_ms: u64,
  },
  Skip,
  GetState,
}

impl SyncAction {
  pub fn parse(action: &str, track_uri: Option<String>, position: Option<u64>) -> Option<Self> {
    match action {
      "play-sync" => Some(Self::Play {
        track_uri,
        position_ms: position.unwrap_or(0),
      }),
      "pause-sync" => Some(Self::Pause),
      "resume-sync" => Some(Self::Resume),
      "seek-sync" => Some(Self::Seek {
        position_ms: position.unwrap_or(0),
      }),
      "skip-sync" => Some(Self::Skip),
      "get-states" => Some(Self::GetState),
      _ => None,
    }
  }
}

/// What happened for one token. Playback snapshot fields are only filled in
/// by `get-states`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenOutcome {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<u16>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_playing: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub progress_ms: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub track_id: Option<String>,
}

impl TokenOutcome {
  fn ok(status: u16) -> Self {
    Self {
      success: true,
      status: Some(status),
      error: None,
      is_playing: None,
      progress_ms: None,
      track_id: None,
    }
  }

  fn failed(status: Option<u16>, error: String) -> Self {
    Self {
      success: false,
      status,
      error: Some(error),
      is_playing: None,
      progress_ms: None,
      track_id: None,
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
  pub drift_ms: u64,
  pub quality: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
  /// Batch-level flag: true iff at least one token succeeded.
  pub success: bool,
  pub succeeded: usize,
  pub total: usize,
  pub results: Vec<TokenOutcome>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub drift: Option<DriftReport>,
}

/// Fire the action at every token concurrently and collect all outcomes.
/// Always returns exactly one result per token.
pub async fn dispatch(client: &Client, tokens: &[String], action: &SyncAction) -> SyncReport {
  let outcomes = join_all(tokens.iter().map(|token| attempt(client, token, action))).await;
  aggregate(outcomes, matches!(action, SyncAction::GetState))
}

pub fn aggregate(results: Vec<TokenOutcome>, with_drift: bool) -> SyncReport {
  let succeeded = results.iter().filter(|r| r.success).count();
  let drift = if with_drift {
    let positions: Vec<u64> = results.iter().filter_map(|r| r.progress_ms).collect();
    drift_of(&positions)
  } else {
    None
  };
  SyncReport {
    success: succeeded > 0,
    succeeded,
    total: results.len(),
    results,
    drift,
  }
}

/// Crude spread metric over whatever positions came back: max minus min.
pub fn drift_of(positions: &[u64]) -> Option<DriftReport> {
  let max = *positions.iter().max()?;
  let min = *positions.iter().min()?;
  let drift_ms = max - min;
  Some(DriftReport {
    drift_ms,
    quality: quality(drift_ms),
  })
}

fn quality(drift_ms: u64) -> &'static str {
  if drift_ms < 1_000 {
    "excellent"
  } else if drift_ms < 3_000 {
    "good"
  } else {
    "poor"
  }
}

async fn attempt(client: &Client, token: &str, action: &SyncAction) -> TokenOutcome {
  let sent = match action {
    SyncAction::Play {
      track_uri,
      position_ms,
    } => {
      let mut body = json!({ "position_ms": position_ms });
      if let Some(uri) = track_uri {
        body["uris"] = json!([uri]);
      }
      client
        .put(format!("{}/me/player/play", API_BASE))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
    }
    SyncAction::Resume => {
      client
        .put(format!("{}/me/player/play", API_BASE))
        .bearer_auth(token)
        .json(&json!({}))
        .send()
        .await
    }
    SyncAction::Pause => {
      client
        .put(format!("{}/me/player/pause", API_BASE))
        .bearer_auth(token)
        .send()
        .await
    }
    SyncAction::Seek { position_ms } => {
      client
        .put(format!("{}/me/player/seek", API_BASE))
        .bearer_auth(token)
        .query(&[("position_ms", position_ms.to_string())])
        .send()
        .await
    }
    SyncAction::Skip => {
      client
        .post(format!("{}/me/player/next", API_BASE))
        .bearer_auth(token)
        .send()
        .await
    }
    SyncAction::GetState => {
      client
        .get(format!("{}/me/player", API_BASE))
        .bearer_auth(token)
        .send()
        .await
    }
  };

  let resp = match sent {
    Ok(resp) => resp,
    Err(err) => return TokenOutcome::failed(None, err.to_string()),
  };

  let status = resp.status();
  if !status.is_success() {
    let body: Value = resp.json().await.unwrap_or_default();
    return TokenOutcome::failed(Some(status.as_u16()), error_message(status, &body));
  }

  if matches!(action, SyncAction::GetState) {
    // 204 = no active device for this token
    if status == reqwest::StatusCode::NO_CONTENT {
      return TokenOutcome::ok(status.as_u16());
    }
    let body: Value = match resp.json().await {
      Ok(body) => body,
      Err(err) => return TokenOutcome::failed(Some(status.as_u16()), err.to_string()),
    };
    let mut outcome = TokenOutcome::ok(status.as_u16());
    outcome.is_playing = body["is_playing"].as_bool();
    outcome.progress_ms = body["progress_ms"].as_u64();
    outcome.track_id = body["item"]["id"].as_str().map(str::to_string);
    return outcome;
  }

  TokenOutcome::ok(status.as_u16())
}
