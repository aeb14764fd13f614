//! Citagraph web service
//!
//! Serves the citation graph page and the JSON API behind it:
//! - Observer access for everyone, admin mode behind a password
//! - Rate-limited admin logins
//! - Request routing
//! - Observability (logging, request ids, metrics)

pub mod handlers;
pub mod middleware;
pub mod state;

pub use state::AppState;

use axum::{
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = state.config.request_timeout();
    let max_concurrent = state.config.server.max_concurrent_requests.max(1);

    // API routes
    let api_routes = Router::new()
        // Session endpoints
        .route(
            "/session",
            post(handlers::session::login).get(handlers::session::current),
        )
        // Paper endpoints
        .route(
            "/papers",
            get(handlers::papers::list_papers).post(handlers::papers::create_paper),
        )
        .route(
            "/papers/{id}",
            get(handlers::papers::get_paper)
                .patch(handlers::papers::update_paper)
                .delete(handlers::papers::delete_paper),
        )
        .route(
            "/papers/{id}/connections",
            get(handlers::papers::get_connections),
        )
        // Import by DOI; kept out of /papers/{id} so any id stays addressable
        .route("/import", post(handlers::papers::import_paper))
        // Citation endpoints
        .route("/citations", post(handlers::citations::create_citation))
        .route(
            "/citations/{citing_id}/{cited_id}",
            delete(handlers::citations::delete_citation),
        )
        // Graph endpoints
        .route("/graph", get(handlers::graph::graph_json))
        .route("/graph.svg", get(handlers::graph::graph_svg));

    // Compose the app
    Router::new()
        .route("/", get(handlers::ui::index))
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::metrics::metrics))
        .nest("/v1", api_routes)
        .layer(axum::middleware::from_fn(middleware::metrics::track_requests))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(ConcurrencyLimitLayer::new(max_concurrent))
        .layer(CompressionLayer::new())
        // Request id is set outermost and copied onto the response
        .layer(propagate_id)
        .layer(TraceLayer::new_for_http())
        .layer(request_id)
        .with_state(state)
}
