use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use jamlink::common::http::HttpClient;
use jamlink::configs::{Config, StoreBackend};
use jamlink::server::AppState;
use jamlink::store::{KvStore, MemoryStore, SessionStore};
use jamlink::transport;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let config = match Config::load() {
    Ok(config) => config,
    Err(err) => {
      eprintln!("no usable config ({}), falling back to defaults", err);
      Config::default()
    }
  };

  let default_level = config
    .logging
    .as_ref()
    .and_then(|l| l.level.clone())
    .unwrap_or_else(|| "info".to_string());
  let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
  tracing_subscriber::fmt().with_env_filter(env_filter).init();

  let http = HttpClient::new()?;

  let store: Arc<dyn SessionStore> = match config.store.backend {
    StoreBackend::Memory => Arc::new(MemoryStore::new()),
    StoreBackend::Kv => {
      let url = config
        .store
        .url
        .clone()
        .ok_or("store.url is required for the kv backend")?;
      let token = config
        .store
        .token
        .clone()
        .ok_or("store.token is required for the kv backend")?;
      Arc::new(KvStore::new(url, token, http.clone()))
    }
  };
  info!("session store backend: {:?}", config.store.backend);

  let ip: IpAddr = config.server.host.parse().unwrap_or_else(|_| {
    warn!("unparseable server.host {:?}, binding 0.0.0.0", config.server.host);
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
  });
  let address = SocketAddr::new(ip, config.server.port);

  let shared_state = Arc::new(AppState {
    config,
    store,
    http,
  });

  let app = transport::http_server::router(shared_state);

  info!("jamlink listening on {}", address);
  let listener = tokio::net::TcpListener::bind(address).await?;
  axum::serve(listener, app).await?;

  Ok(())
}
