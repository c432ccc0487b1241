use axum::extract::State;
use axum::Json;
use catalog_core::cache::IndexCache;
use catalog_core::query::{CategorySummary, TechnologySummary};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/index: the full cached index.
pub async fn get_index(State(app): State<AppState>) -> Result<Json<IndexCache>, AppError> {
    let catalog = app.catalog.clone();
    let index = tokio::task::spawn_blocking(move || catalog.index())
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(index))
}

/// GET /api/categories: categories with subagent counts.
pub async fn list_categories(
    State(app): State<AppState>,
) -> Result<Json<Vec<CategorySummary>>, AppError> {
    let catalog = app.catalog.clone();
    let categories = tokio::task::spawn_blocking(move || catalog.categories())
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(categories))
}

/// GET /api/technologies: technologies by usage.
pub async fn list_technologies(
    State(app): State<AppState>,
) -> Result<Json<Vec<TechnologySummary>>, AppError> {
    let catalog = app.catalog.clone();
    let technologies = tokio::task::spawn_blocking(move || catalog.technologies())
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(technologies))
}
