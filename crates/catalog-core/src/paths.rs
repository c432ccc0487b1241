use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File and directory constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "subagents.yaml";

pub const DEFAULT_SOURCE_DIR: &str = "subagents";
pub const DEFAULT_CACHE_DIR: &str = ".cache/subagents";

pub const INDEX_FILE: &str = "index.json";
pub const CATEGORIES_FILE: &str = "categories.json";
pub const TECHNOLOGIES_FILE: &str = "technologies.json";
pub const FILTERS_DIR: &str = "filters";

/// Path segment every subagent definition must live under.
pub const CATEGORIES_SEGMENT: &str = "categories";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn index_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(INDEX_FILE)
}

pub fn categories_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(CATEGORIES_FILE)
}

pub fn technologies_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(TECHNOLOGIES_FILE)
}

pub fn filters_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join(FILTERS_DIR)
}

pub fn filter_path(cache_dir: &Path, key: &str) -> PathBuf {
    filters_dir(cache_dir).join(format!("{key}.json"))
}

/// Normalize a path to forward slashes so relative paths compare the same on
/// every platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
