pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use catalog_core::Catalog;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(catalog: Arc<Catalog>) -> Router {
    let app_state = state::AppState::new(catalog);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Subagents
        .route("/api/subagents", get(routes::subagents::list_subagents))
        .route("/api/subagents/{id}", get(routes::subagents::get_subagent))
        .route(
            "/api/subagents/{id}/content",
            get(routes::subagents::get_subagent_content),
        )
        // Index and summaries
        .route("/api/index", get(routes::catalog::get_index))
        .route("/api/categories", get(routes::catalog::list_categories))
        .route("/api/technologies", get(routes::catalog::list_technologies))
        // Maintenance
        .route("/api/refresh", post(routes::admin::refresh))
        .route("/api/health", get(routes::admin::health))
        .route("/api/cache/cleanup", post(routes::admin::cleanup_cache))
        .route("/api/cache", axum::routing::delete(routes::admin::clear_cache))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Serve the catalog API on `0.0.0.0:port`.
pub async fn serve(catalog: Arc<Catalog>, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(catalog, listener).await
}

/// Serve on a pre-bound listener, so a caller passing port 0 can read the
/// chosen port first.
pub async fn serve_on(catalog: Arc<Catalog>, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(catalog);

    tracing::info!("subagent catalog listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
