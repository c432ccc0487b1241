use axum::extract::{Query, State};
use axum::Json;
use catalog_core::catalog::{Health, RefreshReport};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    /// Source revision the checkout is at, recorded on the index.
    #[serde(default)]
    pub commit: Option<String>,
}

/// POST /api/refresh: rebuild the index from the source directory.
pub async fn refresh(
    State(app): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<RefreshReport>, AppError> {
    let catalog = app.catalog.clone();
    let commit = params.commit.filter(|c| !c.trim().is_empty());
    let report = tokio::task::spawn_blocking(move || catalog.refresh(commit))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(report))
}

/// GET /api/health: cache stats plus the last built commit.
pub async fn health(State(app): State<AppState>) -> Result<Json<Health>, AppError> {
    let catalog = app.catalog.clone();
    let health = tokio::task::spawn_blocking(move || catalog.health())
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;
    Ok(Json(health))
}

/// POST /api/cache/cleanup: evict expired filter results.
pub async fn cleanup_cache(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let catalog = app.catalog.clone();
    let removed = tokio::task::spawn_blocking(move || catalog.cleanup_expired())
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

/// DELETE /api/cache: drop every cached section.
pub async fn clear_cache(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let catalog = app.catalog.clone();
    tokio::task::spawn_blocking(move || catalog.clear_cache())
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(serde_json::json!({ "cleared": true })))
}
