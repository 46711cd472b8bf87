use reqwest::Client;

use crate::session::code::normalize_code;
use crate::session::model::Session;
use crate::store::{SessionStore, StoreError};

/// REST key-value backend (Upstash-style command paths, bearer auth). The
/// session record is stored as one JSON blob under `session:{CODE}` with the
/// TTL enforced by the service via `EX`.
pub struct KvStore {
  base_url: String,
  token: String,
  client: Client,
}

impl KvStore {
  pub fn new(base_url: String, token: String, client: Client) -> Self {
    Self {
      base_url: base_url.trim_end_matches('/').to_string(),
      token,
      client,
    }
  }

  fn key(code: &str) -> String {
    format!("session:{}", normalize_code(code))
  }

  async fn command(&self, path: String, body: Option<String>) -> Result<serde_json::Value, StoreError> {
    let url = format!("{}/{}", self.base_url, path);
    let mut req = self.client.post(&url).bearer_auth(&self.token);
    if let Some(body) = body {
      req = req.body(body);
    }
    let resp = req
      .send()
      .await
      .map_err(|e| StoreError(format!("kv unreachable: {}", e)))?;
    let status = resp.status();
    if !status.is_success() {
      return Err(StoreError(format!("kv returned {}", status.as_u16())));
    }
    resp
      .json()
      .await
      .map_err(|e| StoreError(format!("kv sent malformed response: {}", e)))
  }
}

#[async_trait::async_trait]
impl SessionStore for KvStore {
  async fn get(&self, code: &str) -> Result<Option<Session>, StoreError> {
    let value = self
      .command(format!("get/{}", urlencoding::encode(&Self::key(code))), None)
      .await?;
    match value.get("result") {
      Some(serde_json::Value::String(raw)) => serde_json::from_str(raw)
        .map(Some)
        .map_err(|e| StoreError(format!("kv held malformed session: {}", e))),
      _ => Ok(None),
    }
  }

  async fn set(&self, code: &str, session: &Session, ttl_secs: u64) -> Result<(), StoreError> {
    let raw = serde_json::to_string(session)
      .map_err(|e| StoreError(format!("session not serializable: {}", e)))?;
    self
      .command(
        format!(
          "set/{}?EX={}",
          urlencoding::encode(&Self::key(code)),
          ttl_secs
        ),
        Some(raw),
      )
      .await?;
    Ok(())
  }

  async fn delete(&self, code: &str) -> Result<bool, StoreError> {
    let value = self
      .command(format!("del/{}", urlencoding::encode(&Self::key(code))), None)
      .await?;
    Ok(value.get("result").and_then(|v| v.as_u64()).unwrap_or(0) > 0)
  }
}
