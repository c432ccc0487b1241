use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use catalog_core::error::CatalogError;

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

/// Status and machine-readable code for a core error.
fn classify(e: &CatalogError) -> (StatusCode, &'static str) {
    match e {
        CatalogError::IndexUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "index_unavailable"),
        CatalogError::SourceNotFound(_) => (StatusCode::SERVICE_UNAVAILABLE, "source_unavailable"),
        CatalogError::SubagentNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        CatalogError::InvalidFilter(_)
        | CatalogError::InvalidExperienceLevel(_)
        | CatalogError::InvalidComplexity(_) => (StatusCode::BAD_REQUEST, "invalid_filter"),
        CatalogError::InvalidConfig(_)
        | CatalogError::Io(_)
        | CatalogError::Yaml(_)
        | CatalogError::Json(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match self.0.downcast_ref::<CatalogError>() {
            Some(e) => classify(e),
            None => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), "request failed: {:#}", self.0);
        }

        let body = serde_json::json!({ "error": self.0.to_string(), "code": code });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
