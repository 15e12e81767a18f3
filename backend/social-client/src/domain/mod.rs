pub mod models;
mod relation;

pub use models::*;
