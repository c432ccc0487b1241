use crate::output::print_json;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum CacheSubcommand {
    /// Show what the cache holds
    Stats,

    /// Evict expired filter results
    Cleanup,

    /// Delete every cached section
    Clear,
}

pub fn run(root: &Path, subcmd: CacheSubcommand, json: bool) -> anyhow::Result<()> {
    let catalog = super::open_catalog(root)?;
    match subcmd {
        CacheSubcommand::Stats => {
            let stats = catalog.cache_stats();
            if json {
                return print_json(&stats);
            }
            println!("Cache dir:    {}", catalog.cache().dir().display());
            match stats.last_update {
                Some(ts) => println!(
                    "Index:        {} subagents, updated {}{}",
                    stats.index_size,
                    ts.to_rfc3339(),
                    if catalog.is_stale() { " (stale)" } else { "" }
                ),
                None => println!("Index:        not built"),
            }
            println!("Filters:      {}", stats.filter_entries);
            println!("Categories:   {}", stats.categories_count);
            println!("Technologies: {}", stats.technologies_count);
        }
        CacheSubcommand::Cleanup => {
            let removed = catalog.cleanup_expired();
            if json {
                return print_json(&serde_json::json!({ "removed": removed }));
            }
            println!("Removed {removed} expired filter entries.");
        }
        CacheSubcommand::Clear => {
            catalog.clear_cache()?;
            if json {
                return print_json(&serde_json::json!({ "cleared": true }));
            }
            println!("Cache cleared.");
        }
    }
    Ok(())
}
