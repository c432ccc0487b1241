use crate::output::print_json;
use std::path::Path;

pub fn run(root: &Path, commit: Option<String>, json: bool) -> anyhow::Result<()> {
    let catalog = super::open_catalog(root)?;
    let report = catalog.refresh(commit)?;

    if json {
        return print_json(&report);
    }

    println!(
        "Indexed {} subagents ({} invalid, {} dropped)",
        report.indexed, report.invalid, report.dropped
    );
    println!(
        "{} categories, {} technologies",
        report.categories, report.technologies
    );
    if let Some(commit) = &report.commit {
        println!("Commit: {commit}");
    }
    for (reason, count) in &report.stats.by_reason {
        println!("  skipped {count}: {reason}");
    }
    Ok(())
}
