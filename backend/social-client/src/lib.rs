/// Social Client Library
///
/// Client-side core of the photo-sharing app: optimistic like/save toggling,
/// cursor-paged feeds, and the post mutation pipeline, all running against a
/// hosted backend reached through the traits in `backend`.
///
/// # Modules
///
/// - `backend`: collaborator traits, query builder, and the HTTP adapter
/// - `domain`: posts, saved records, users, and mutation inputs
/// - `services`: interaction manager, feed pager, post pipeline, accounts
/// - `error`: typed error kinds shared by every call wrapper
/// - `config`: configuration management
///
/// `SocialClient` wires every service over a single backend.
pub mod backend;
mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;

pub use client::SocialClient;
pub use config::Config;
pub use error::{SocialError, SocialResult};
