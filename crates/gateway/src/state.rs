//! Application state shared across handlers

use crate::middleware::rate_limit::{create_login_limiter, LoginRateLimiter};
use axum::extract::FromRef;
use citagraph_common::{
    config::AppConfig,
    crossref::CrossrefClient,
    errors::Result,
    AdminAuth, LibraryStore, MetadataSource,
};
use citagraph_graph::{ColorMode, LayoutKind};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<LibraryStore>,
    pub auth: Arc<AdminAuth>,
    pub metadata: Arc<dyn MetadataSource>,
    pub login_limiter: Arc<LoginRateLimiter>,
    /// Present when the Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Assemble state from explicit parts
    pub fn new(
        config: AppConfig,
        store: LibraryStore,
        auth: AdminAuth,
        metadata: Arc<dyn MetadataSource>,
    ) -> Self {
        let login_limiter = create_login_limiter(
            config.rate_limit.login_per_minute,
            config.rate_limit.login_burst,
        );

        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            auth: Arc::new(auth),
            metadata,
            login_limiter,
            metrics: None,
        }
    }

    /// Build everything the server needs from configuration
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let store = LibraryStore::new(&config.storage);
        let auth = AdminAuth::from_config(&config.auth)?;
        let metadata: Arc<dyn MetadataSource> = Arc::new(CrossrefClient::new(&config.crossref)?);
        Ok(Self::new(config, store, auth, metadata))
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Layout used when a request names none
    pub fn default_layout(&self) -> LayoutKind {
        self.config
            .render
            .default_layout
            .parse()
            .unwrap_or_default()
    }

    /// Color mode used when a request names none
    pub fn default_color_mode(&self) -> ColorMode {
        self.config
            .render
            .default_color_mode
            .parse()
            .unwrap_or_default()
    }
}

impl FromRef<AppState> for Arc<AdminAuth> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
