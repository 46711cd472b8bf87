pub mod kv;
pub mod memory;

pub use kv::KvStore;
pub use memory::MemoryStore;

use crate::common::ApiError;
use crate::session::model::Session;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl From<StoreError> for ApiError {
  fn from(err: StoreError) -> Self {
    ApiError::Storage(err.0)
  }
}

/// Get/set/delete by code with best-effort TTL expiry. No compare-and-swap:
/// handlers read the whole record, mutate it in memory and write it back, so
/// two concurrent writers to one code can lose an update. That race is part
/// of the contract, not a bug in either backend.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
  async fn get(&self, code: &str) -> Result<Option<Session>, StoreError>;
  async fn set(&self, code: &str, session: &Session, ttl_secs: u64) -> Result<(), StoreError>;
  async fn delete(&self, code: &str) -> Result<bool, StoreError>;
}
