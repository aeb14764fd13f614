//! API handlers module

pub mod citations;
pub mod graph;
pub mod health;
pub mod metrics;
pub mod papers;
pub mod session;
pub mod ui;

use citagraph_common::errors::{AppError, Result};

/// Run file I/O or layout work on the blocking pool
pub(crate) async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Blocking task failed: {}", e),
        })?
}
