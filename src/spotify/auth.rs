use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::common::ApiResult;
use crate::configs::SpotifyConfig;
use crate::spotify::{ACCOUNTS_BASE, upstream_failure};

/// Scopes needed to read and drive playback on the host and any linked guest.
pub const DEFAULT_SCOPES: &str = "streaming user-read-email user-read-private \
user-read-playback-state user-modify-playback-state user-read-currently-playing";

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
  pub access_token: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub refresh_token: Option<String>,
  pub expires_in: u64,
}

pub fn authorize_url(config: &SpotifyConfig) -> String {
  let scopes = config.scopes.as_deref().unwrap_or(DEFAULT_SCOPES);
  format!(
    "{}/authorize?response_type=code&client_id={}&scope={}&redirect_uri={}",
    ACCOUNTS_BASE,
    urlencoding::encode(&config.client_id),
    urlencoding::encode(scopes),
    urlencoding::encode(&config.redirect_uri),
  )
}

/// Exchange an authorization code for an access/refresh token pair.
pub async fn exchange_code(
  client: &Client,
  config: &SpotifyConfig,
  code: &str,
) -> ApiResult<TokenResponse> {
  token_request(
    client,
    config,
    &[
      ("grant_type", "authorization_code"),
      ("code", code),
      ("redirect_uri", &config.redirect_uri),
    ],
  )
  .await
}

/// Exchange a refresh token for a fresh access token.
pub async fn refresh_token(
  client: &Client,
  config: &SpotifyConfig,
  refresh: &str,
) -> ApiResult<TokenResponse> {
  token_request(
    client,
    config,
    &[("grant_type", "refresh_token"), ("refresh_token", refresh)],
  )
  .await
}

async fn token_request(
  client: &Client,
  config: &SpotifyConfig,
  params: &[(&str, &str)],
) -> ApiResult<TokenResponse> {
  let basic = BASE64.encode(format!("{}:{}", config.client_id, config.client_secret));
  let resp = client
    .post(format!("{}/api/token", ACCOUNTS_BASE))
    .header("Authorization", format!("Basic {}", basic))
    .form(params)
    .send()
    .await?;

  if !resp.status().is_success() {
    return Err(upstream_failure(resp).await);
  }
  Ok(resp.json().await?)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config() -> SpotifyConfig {
    SpotifyConfig {
      client_id: "client-id".into(),
      client_secret: "client-secret".into(),
      redirect_uri: "http://localhost:3000/api/auth/callback".into(),
      frontend_url: "http://localhost:5173".into(),
      scopes: None,
    }
  }

  #[test]
  fn authorize_url_carries_encoded_redirect_and_scopes() {
    let url = authorize_url(&config());
    assert!(url.starts_with("https://accounts.spotify.com/authorize?response_type=code"));
    assert!(url.contains("client_id=client-id"));
    assert!(url.contains("user-modify-playback-state"));
    assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapi%2Fauth%2Fcallback"));
  }

  #[test]
  fn scope_override_replaces_defaults() {
    let mut cfg = config();
    cfg.scopes = Some("streaming".into());
    let url = authorize_url(&cfg);
    assert!(url.contains("scope=streaming&"));
    assert!(!url.contains("user-read-email"));
  }
}
