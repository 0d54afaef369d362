//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound port traits: HTTP progress and auth services,
//! durable slot stores, static catalog and fallback directory.

mod catalog;
mod directory;
mod file_store;
mod http_auth;
mod http_progress;
mod memory_store;

pub use catalog::StaticCatalog;
pub use directory::StaticDirectory;
pub use file_store::FileSessionStore;
pub use http_auth::HttpAuthService;
pub use http_progress::HttpProgressService;
pub use memory_store::InMemorySessionStore;
