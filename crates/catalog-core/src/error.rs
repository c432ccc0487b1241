use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("subagent index not built yet: run a refresh first")]
    IndexUnavailable,

    #[error("subagent not found: {0}")]
    SubagentNotFound(String),

    #[error("source directory not found: {0}")]
    SourceNotFound(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid experience level: {0}")]
    InvalidExperienceLevel(String),

    #[error("invalid complexity: {0}")]
    InvalidComplexity(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
