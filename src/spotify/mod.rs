pub mod auth;
pub mod player;
pub mod search;
pub mod sync;

use crate::common::ApiError;

pub const API_BASE: &str = "https://api.spotify.com/v1";
pub const ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Spotify error bodies look like `{"error": {"status": n, "message": "..."}}`;
/// fall back to the status text when the body is something else.
pub(crate) fn error_message(status: reqwest::StatusCode, body: &serde_json::Value) -> String {
  body
    .get("error")
    .and_then(|e| e.get("message"))
    .and_then(|m| m.as_str())
    .map(str::to_string)
    .or_else(|| body.get("error_description").and_then(|m| m.as_str()).map(str::to_string))
    .unwrap_or_else(|| {
      status
        .canonical_reason()
        .unwrap_or("upstream error")
        .to_string()
    })
}

/// Turn a non-2xx upstream response into an [`ApiError`] carrying the
/// original status.
pub(crate) async fn upstream_failure(resp: reqwest::Response) -> ApiError {
  let status = resp.status();
  let body: serde_json::Value = resp.json().await.unwrap_or_default();
  ApiError::Upstream {
    status: status.as_u16(),
    message: error_message(status, &body),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn extracts_spotify_error_message() {
    let body = json!({"error": {"status": 404, "message": "Device not found"}});
    let msg = error_message(reqwest::StatusCode::NOT_FOUND, &body);
    assert_eq!(msg, "Device not found");
  }

  #[test]
  fn falls_back_to_status_text() {
    let msg = error_message(reqwest::StatusCode::FORBIDDEN, &json!({}));
    assert_eq!(msg, "Forbidden");
  }

  #[test]
  fn reads_oauth_error_description() {
    let body = json!({"error": "invalid_grant", "error_description": "Invalid refresh token"});
    let msg = error_message(reqwest::StatusCode::BAD_REQUEST, &body);
    assert_eq!(msg, "Invalid refresh token");
  }
}
