use std::sync::Arc;

use crate::configs::Config;
use crate::store::SessionStore;

/// Shared application state handed to every handler.
pub struct AppState {
  pub config: Config,
  pub store: Arc<dyn SessionStore>,
  /// One reqwest client reused for every upstream call.
  pub http: reqwest::Client,
}
