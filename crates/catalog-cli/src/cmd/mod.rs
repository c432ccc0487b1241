pub mod build;
pub mod cache;
pub mod config;
pub mod list;
pub mod serve;
pub mod show;
pub mod summary;
pub mod validate;

use anyhow::Context;
use catalog_core::config::CatalogConfig;
use catalog_core::Catalog;
use std::path::Path;

/// Load `subagents.yaml` under `root` and open the catalog it describes.
pub fn open_catalog(root: &Path) -> anyhow::Result<Catalog> {
    let config = CatalogConfig::load(root).context("failed to load config")?;
    Catalog::open(config).context("failed to open catalog")
}
