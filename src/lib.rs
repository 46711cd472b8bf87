pub mod common;
pub mod configs;
pub mod server;
pub mod session;
pub mod spotify;
pub mod store;
pub mod transport;
