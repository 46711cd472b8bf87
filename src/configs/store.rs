use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
  #[default]
  Memory,
  Kv,
}

/// Session store selection. `memory` needs nothing else; `kv` points at a
/// REST key-value service (url + bearer token).
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StoreConfig {
  #[serde(default)]
  pub backend: StoreBackend,
  pub url: Option<String>,
  pub token: Option<String>,
}
