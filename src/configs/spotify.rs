use serde::{Deserialize, Serialize};

/// Spotify application credentials for the authorization-code flow.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SpotifyConfig {
  #[serde(rename = "clientId")]
  pub client_id: String,
  #[serde(rename = "clientSecret")]
  pub client_secret: String,
  #[serde(rename = "redirectUri")]
  pub redirect_uri: String,
  /// Where the auth callback sends the browser back to, tokens in the URL.
  #[serde(rename = "frontendUrl")]
  pub frontend_url: String,
  /// Overrides the default scope set when present.
  pub scopes: Option<String>,
}
