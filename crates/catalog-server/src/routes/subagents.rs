use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use catalog_core::category;
use catalog_core::error::CatalogError;
use catalog_core::query::{QueryResult, SubagentFilter};
use catalog_core::record::SubagentRecord;
use catalog_core::types::{Complexity, ExperienceLevel, SortField, SortOrder};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Query-string form of a filter. Enum fields arrive as strings so a bad
/// value becomes a 400 with a useful message instead of a bare rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub category: Option<String>,
    /// Comma separated.
    #[serde(default)]
    pub technologies: Option<String>,
    #[serde(default, alias = "experienceLevel")]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub complexity: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, alias = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(default, alias = "sortOrder")]
    pub sort_order: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

fn blank_to_none(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

impl ListParams {
    pub fn into_filter(self) -> Result<SubagentFilter, CatalogError> {
        let category = blank_to_none(self.category);
        if let Some(cat) = category.as_deref() {
            if category::find_category(&cat.trim().to_ascii_lowercase()).is_none() {
                return Err(CatalogError::InvalidFilter(format!("unknown category: {cat}")));
            }
        }
        let technologies = self
            .technologies
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Ok(SubagentFilter {
            category,
            technologies,
            experience_level: blank_to_none(self.experience_level)
                .map(|v| v.parse::<ExperienceLevel>())
                .transpose()?,
            complexity: blank_to_none(self.complexity)
                .map(|v| v.parse::<Complexity>())
                .transpose()?,
            search: blank_to_none(self.search),
            sort_by: blank_to_none(self.sort_by)
                .map(|v| v.parse::<SortField>())
                .transpose()?
                .unwrap_or_default(),
            sort_order: blank_to_none(self.sort_order)
                .map(|v| v.parse::<SortOrder>())
                .transpose()?
                .unwrap_or_default(),
            page: self.page,
            limit: self.limit,
        })
    }
}

/// GET /api/subagents: one page of the filtered index.
pub async fn list_subagents(
    State(app): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<QueryResult>, AppError> {
    let catalog = app.catalog.clone();
    let result = tokio::task::spawn_blocking(move || {
        let filter = params.into_filter()?;
        catalog.query(&filter)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /api/subagents/{id}
pub async fn get_subagent(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubagentRecord>, AppError> {
    let catalog = app.catalog.clone();
    let record = tokio::task::spawn_blocking(move || catalog.subagent(&id))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(record))
}

/// GET /api/subagents/{id}/content: raw markdown.
pub async fn get_subagent_content(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let catalog = app.catalog.clone();
    let content = tokio::task::spawn_blocking(move || catalog.content(&id))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        content,
    ))
}
