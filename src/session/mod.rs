pub mod actions;
pub mod code;
pub mod model;

pub use model::*;
