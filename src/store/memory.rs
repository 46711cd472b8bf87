use dashmap::DashMap;

use crate::common::now_ms;
use crate::session::code::normalize_code;
use crate::session::model::Session;
use crate::store::{SessionStore, StoreError};

struct Entry {
  session: Session,
  ttl_secs: u64,
}

/// Single-instance store: one map, expiry by an age check on read. Expired
/// entries are removed lazily; there is no background sweep.
#[derive(Default)]
pub struct MemoryStore {
  entries: DashMap<String, Entry>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

fn expired(entry: &Entry, now: u64) -> bool {
  now.saturating_sub(entry.session.created_at) >= entry.ttl_secs * 1_000
}

#[async_trait::async_trait]
impl SessionStore for MemoryStore {
  async fn get(&self, code: &str) -> Result<Option<Session>, StoreError> {
    let key = normalize_code(code);
    if let Some(entry) = self.entries.get(&key) {
      if expired(&entry, now_ms()) {
        drop(entry);
        self.entries.remove(&key);
        return Ok(None);
      }
      return Ok(Some(entry.session.clone()));
    }
    Ok(None)
  }

  async fn set(&self, code: &str, session: &Session, ttl_secs: u64) -> Result<(), StoreError> {
    self.entries.insert(
      normalize_code(code),
      Entry {
        session: session.clone(),
        ttl_secs,
      },
    );
    Ok(())
  }

  async fn delete(&self, code: &str) -> Result<bool, StoreError> {
    Ok(self.entries.remove(&normalize_code(code)).is_some())
  }
}
