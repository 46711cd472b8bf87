pub mod base;
pub mod server;
pub mod spotify;
pub mod store;

pub use base::*;
pub use server::*;
pub use spotify::*;
pub use store::*;
