//! Citagraph Common Library
//!
//! Shared code for the citagraph crates including:
//! - Paper and citation models
//! - The in-memory library and its JSON file store
//! - DOI metadata lookup
//! - Error types and handling
//! - Configuration management
//! - Admin authentication
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod crossref;
pub mod errors;
pub mod library;
pub mod metrics;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use auth::{AdminAuth, ViewerMode};
pub use config::AppConfig;
pub use crossref::{MetadataSource, PaperMetadata};
pub use errors::{AppError, Result};
pub use library::Library;
pub use models::{Citation, Paper};
pub use store::LibraryStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
