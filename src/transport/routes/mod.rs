pub mod auth_routes;
pub mod player_routes;
pub mod search_routes;
pub mod session_routes;
pub mod sync_routes;
