//! Course platform API integration
//!
//! Provides token storage, the HTTP client, and the wire models for the
//! catalog, progress, assistant, and auth endpoints.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use auth::{KeyringTokenStore, MemoryTokenStore, TokenStore};
pub use client::PlatformClient;
pub use error::ApiError;
