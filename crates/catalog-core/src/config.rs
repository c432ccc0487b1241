use crate::error::{CatalogError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// CatalogConfig
// ---------------------------------------------------------------------------

/// Settings read from `subagents.yaml` at the project root. Every key is
/// optional; relative directories resolve against the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory the git-sync collaborator checks the subagent repo out into.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Minimum non-blank body lines a definition needs to be accepted.
    #[serde(default = "default_min_content_lines")]
    pub min_content_lines: usize,
    #[serde(default = "default_filter_ttl_secs")]
    pub filter_ttl_secs: u64,
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_SOURCE_DIR)
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_CACHE_DIR)
}

fn default_min_content_lines() -> usize {
    20
}

fn default_filter_ttl_secs() -> u64 {
    5 * 60
}

fn default_stale_after_secs() -> u64 {
    60 * 60
}

fn default_page_size() -> usize {
    20
}

fn default_max_page_size() -> usize {
    100
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            cache_dir: default_cache_dir(),
            min_content_lines: default_min_content_lines(),
            filter_ttl_secs: default_filter_ttl_secs(),
            stale_after_secs: default_stale_after_secs(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

// chrono panics past i64::MAX milliseconds.
fn secs(n: u64) -> chrono::Duration {
    let n = i64::try_from(n).unwrap_or(i64::MAX).min(i64::MAX / 1_000);
    chrono::Duration::seconds(n)
}

impl CatalogConfig {
    /// Load `subagents.yaml` from `root`. A missing file yields the defaults.
    /// Relative directories in the result are already joined onto `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let cfg = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            if data.trim().is_empty() {
                CatalogConfig::default()
            } else {
                serde_yaml::from_str(&data)?
            }
        } else {
            CatalogConfig::default()
        };
        Ok(cfg.rooted(root))
    }

    /// Resolve relative directories against `root`.
    pub fn rooted(mut self, root: &Path) -> Self {
        if self.source_dir.is_relative() {
            self.source_dir = root.join(&self.source_dir);
        }
        if self.cache_dir.is_relative() {
            self.cache_dir = root.join(&self.cache_dir);
        }
        self
    }

    pub fn filter_ttl(&self) -> chrono::Duration {
        secs(self.filter_ttl_secs)
    }

    pub fn stale_after(&self) -> chrono::Duration {
        secs(self.stale_after_secs)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.min_content_lines == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "min_content_lines is 0: every definition passes the length check"
                    .to_string(),
            });
        }

        if self.filter_ttl_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "filter_ttl_secs is 0: filter results are never reused".to_string(),
            });
        }

        if self.max_page_size == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "max_page_size must be at least 1".to_string(),
            });
        }

        if self.default_page_size > self.max_page_size {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "default_page_size ({}) exceeds max_page_size ({}); it will be clamped",
                    self.default_page_size, self.max_page_size
                ),
            });
        }

        if !self.source_dir.is_dir() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "source_dir '{}' does not exist yet",
                    self.source_dir.display()
                ),
            });
        }

        warnings
    }

    /// Fail on any error-level warning.
    pub fn ensure_valid(&self) -> Result<()> {
        let errors: Vec<String> = self
            .validate()
            .into_iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message)
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::InvalidConfig(errors.join("; ")))
        }
    }
}
