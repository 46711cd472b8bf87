use std::sync::Arc;

use axum::{
  Router,
  routing::{any, get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::{
  server::AppState,
  transport::routes::{auth_routes, player_routes, search_routes, session_routes, sync_routes},
};

const API: &str = "/api";

pub fn router(state: Arc<AppState>) -> Router {
  let api_routes = Router::new()
    .route("/session", any(session_routes::handle))
    .route("/player", any(player_routes::handle))
    .route("/sync", post(sync_routes::handle))
    .route("/search", get(search_routes::handle))
    .route("/auth/login", get(auth_routes::login))
    .route("/auth/callback", get(auth_routes::callback))
    .route("/auth/refresh", post(auth_routes::refresh));

  // fully open CORS: the frontend is served from anywhere, and every client
  // talks to this API directly
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods(Any)
    .allow_headers(Any);

  Router::new()
    .nest(API, api_routes)
    .with_state(state)
    .layer(cors)
    .layer(tower_http::trace::TraceLayer::new_for_http())
}
